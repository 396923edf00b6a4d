//! Typed records for the entity hierarchy.
//!
//! # Design
//! Each entity is a serde struct paired with a [`Schema`]. Records coming
//! back from the server are unwrapped from their per-item envelope and
//! checked against the schema before deserialization; records going out are
//! checked for create or update permissions. Structured fields the client
//! never interprets (`targeting`, `regulations`, ...) are kept as raw
//! `serde_json::Value`.
//!
//! The operations for each entity are inherent methods on
//! [`AdsApi`](crate::AdsApi), defined next to the entity they return.

mod ad;
mod ad_account;
mod ad_squad;
mod campaign;
mod organization;
mod user;

pub use ad::Ad;
pub use ad_account::AdAccount;
pub use ad_squad::AdSquad;
pub use campaign::Campaign;
pub use organization::Organization;
pub use user::{Bitmoji, User};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::resource::{Collection, ListOptions, ResourceAddress};
use crate::schema::{Fields, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

/// A record type of the ads API.
pub trait Entity: Serialize + DeserializeOwned {
    const SCHEMA: Schema;
    /// Key wrapping each item in list and bulk responses.
    const ENVELOPE: Option<&'static str> = None;
    /// Field holding the id of the parent collection entry.
    const PARENT_FIELD: Option<&'static str> = None;

    fn id(&self) -> &str;

    /// Build the entity from a server record, rejecting undeclared fields.
    fn from_json(value: Value) -> Result<Self, ApiError> {
        let value = match Self::ENVELOPE {
            Some(key) => unwrap_envelope(value, key)?,
            None => value,
        };
        let Value::Object(fields) = value else {
            return Err(ApiError::MalformedResponse(format!(
                "{} record is not an object",
                Self::SCHEMA.entity
            )));
        };
        Self::SCHEMA.check_known(&fields)?;
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApiError::Deserialization(format!("{}: {e}", Self::SCHEMA.entity)))
    }

    fn to_json(&self) -> Result<Value, ApiError> {
        serde_json::to_value(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// The full record with `changes` applied, ready for a bulk update.
    fn with_changes(&self, changes: &Fields) -> Result<Value, ApiError> {
        Self::SCHEMA.check_update(changes)?;
        let mut record = self.to_json()?;
        let Some(object) = record.as_object_mut() else {
            return Err(ApiError::Serialization(format!(
                "{} did not serialize to an object",
                Self::SCHEMA.entity
            )));
        };
        for (key, value) in changes {
            object.insert(key.clone(), value.clone());
        }
        Ok(record)
    }
}

/// Strip the `{"sub_request_status": .., "<key>": {..}}` wrapper when present.
pub(crate) fn unwrap_envelope(value: Value, key: &str) -> Result<Value, ApiError> {
    let Value::Object(mut map) = value else {
        return Ok(value);
    };

    // A failed item may carry only the status and reason, with no record.
    if let Some(status) = map.get("sub_request_status").and_then(Value::as_str) {
        if !status.eq_ignore_ascii_case("SUCCESS") {
            let message = map
                .get("sub_request_error_reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ApiError::SubRequest {
                status: status.to_string(),
                message,
            });
        }
    }
    if !matches!(map.get(key), Some(Value::Object(_))) {
        return Ok(Value::Object(map));
    }
    Ok(map.remove(key).unwrap_or(Value::Null))
}

fn decode_all<E: Entity>(items: Vec<Value>) -> Result<Vec<E>, ApiError> {
    items.into_iter().map(E::from_json).collect()
}

fn first<E: Entity>(items: Vec<Value>) -> Result<E, ApiError> {
    let item = items.into_iter().next().ok_or_else(|| {
        ApiError::MalformedResponse(format!("empty {} response", E::SCHEMA.entity))
    })?;
    E::from_json(item)
}

impl<T: Transport> AdsApi<T> {
    pub(crate) fn list_children<E: Entity>(
        &self,
        parent: Collection,
        parent_id: &str,
        child: Collection,
        options: &ListOptions,
    ) -> Result<Vec<E>, ApiError> {
        let address = ResourceAddress::nested(parent, parent_id, child)?;
        decode_all(self.list_entities(&address, options)?)
    }

    /// Single entity by id. The payload is either the record itself or a
    /// one-element list of envelopes.
    pub(crate) fn get_one<E: Entity>(&self, collection: Collection, id: &str) -> Result<E, ApiError> {
        match self.get_entity(collection.plural(), id)? {
            Value::Array(items) => first(items),
            item => E::from_json(item),
        }
    }

    /// Validate every record, then create them in one request. The parent
    /// id is filled in on records that omit it.
    pub(crate) fn create_children<E: Entity>(
        &self,
        parent: Collection,
        parent_id: &str,
        child: Collection,
        records: Vec<Fields>,
    ) -> Result<Vec<E>, ApiError> {
        let address = ResourceAddress::nested(parent, parent_id, child)?;
        let mut payload = Vec::with_capacity(records.len());
        for mut record in records {
            if let Some(field) = E::PARENT_FIELD {
                record
                    .entry(field)
                    .or_insert_with(|| Value::String(parent_id.to_string()));
            }
            E::SCHEMA.check_create(&record)?;
            payload.push(Value::Object(record));
        }
        decode_all(self.create_entities(&address, &payload)?)
    }

    /// PUT `entity` with `changes` applied to its parent collection.
    pub(crate) fn update_child<E: Entity>(
        &self,
        parent: Collection,
        child: Collection,
        entity: &E,
        changes: &Fields,
    ) -> Result<E, ApiError> {
        let record = entity.with_changes(changes)?;
        let parent_id = E::PARENT_FIELD
            .and_then(|field| record.get(field))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "{} {} has no parent id to address the update",
                    E::SCHEMA.entity,
                    entity.id()
                ))
            })?
            .to_string();
        let address = ResourceAddress::nested(parent, &parent_id, child)?;
        first(self.update_entities(&address, &[record])?)
    }
}
