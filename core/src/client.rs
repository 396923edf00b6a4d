//! Stateless HTTP request builder and response parser for the ads API.
//!
//! # Design
//! `AdsClient` holds only a `base_url` and carries no mutable state between
//! calls. Each primitive is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The primitives are generic over collection names: every entity in the
//! hierarchy goes through the same five request shapes. Authentication and
//! I/O belong to the session layer.

use serde_json::Value;

use crate::endpoint::build_url;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resource::{ListOptions, ResourceAddress};

/// Default API root. The trailing slash keeps the version segment when
/// endpoints are joined onto it.
pub const DEFAULT_BASE_URL: &str = "https://adsapi.snapchat.com/v1/";

/// Outcome of the first list request.
#[derive(Debug, Clone, PartialEq)]
pub enum ListPage {
    /// No `limit` was sent: the payload is the whole result.
    Single(Vec<Value>),
    /// `limit` was sent: the body is the first page of a cursor chain.
    Paged(Value),
}

/// Synchronous, stateless request builder for the ads API.
#[derive(Debug, Clone)]
pub struct AdsClient {
    base_url: String,
}

impl Default for AdsClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl AdsClient {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.trim_end_matches('/').to_string();
        base_url.push('/');
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Generic primitives
    // -----------------------------------------------------------------------

    pub fn build_list_entities(&self, address: &ResourceAddress, options: &ListOptions) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.collection_url(address))
            .with_query(options.query_pairs())
            .with_timeout(options.timeout)
    }

    /// Parse the first list response.
    ///
    /// Without a `limit` the server is expected to return everything at
    /// once, so any `paging.next_link` in the body is ignored.
    pub fn parse_list_entities(
        &self,
        address: &ResourceAddress,
        options: &ListOptions,
        response: HttpResponse,
    ) -> Result<ListPage, ApiError> {
        let body = parse_json(response)?;
        if options.limit.is_some() {
            return Ok(ListPage::Paged(body));
        }
        into_list(take_key(body, address.child())?, address.child()).map(ListPage::Single)
    }

    /// GET for a pagination cursor. The cursor is an absolute URL and is
    /// requested as-is.
    pub fn build_follow_link(&self, next_link: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, next_link)
    }

    pub fn build_get_entity(&self, collection: &str, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::new(HttpMethod::Get, self.entity_url(collection, id)?))
    }

    /// Returns `response[collection]` unchanged.
    pub fn parse_get_entity(&self, collection: &str, response: HttpResponse) -> Result<Value, ApiError> {
        take_key(parse_json(response)?, collection)
    }

    pub fn build_create_entities(
        &self,
        address: &ResourceAddress,
        records: &[Value],
    ) -> Result<HttpRequest, ApiError> {
        if records.is_empty() {
            return Err(ApiError::InvalidRequest(format!(
                "no records to create under {address}"
            )));
        }
        let body = to_json_body(records)?;
        Ok(HttpRequest::new(HttpMethod::Post, self.collection_url(address)).with_json_body(body))
    }

    pub fn parse_create_entities(
        &self,
        address: &ResourceAddress,
        response: HttpResponse,
    ) -> Result<Vec<Value>, ApiError> {
        into_list(take_key(parse_json(response)?, address.child())?, address.child())
    }

    /// Every record must carry the `id` of the entity it updates.
    pub fn build_update_entities(
        &self,
        address: &ResourceAddress,
        records: &[Value],
    ) -> Result<HttpRequest, ApiError> {
        if records.is_empty() {
            return Err(ApiError::InvalidRequest(format!(
                "no records to update under {address}"
            )));
        }
        if let Some(pos) = records.iter().position(|r| !has_id(r)) {
            return Err(ApiError::InvalidRequest(format!(
                "record {pos} for {address} has no id"
            )));
        }
        let body = to_json_body(records)?;
        Ok(HttpRequest::new(HttpMethod::Put, self.collection_url(address)).with_json_body(body))
    }

    pub fn parse_update_entities(
        &self,
        address: &ResourceAddress,
        response: HttpResponse,
    ) -> Result<Vec<Value>, ApiError> {
        into_list(take_key(parse_json(response)?, address.child())?, address.child())
    }

    pub fn build_delete_entity(&self, collection: &str, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::new(HttpMethod::Delete, self.entity_url(collection, id)?))
    }

    pub fn parse_delete_entity(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Caller-scoped endpoints
    // -----------------------------------------------------------------------

    pub fn build_get_me(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, build_url(&self.base_url, "me", None))
    }

    pub fn parse_get_me(&self, response: HttpResponse) -> Result<Value, ApiError> {
        take_key(parse_json(response)?, "me")
    }

    pub fn build_list_organizations(&self, with_ad_accounts: bool) -> HttpRequest {
        let query = if with_ad_accounts {
            vec![("with_ad_accounts".to_string(), "true".to_string())]
        } else {
            Vec::new()
        };
        HttpRequest::new(
            HttpMethod::Get,
            build_url(&self.base_url, "me", Some("organizations")),
        )
        .with_query(query)
    }

    pub fn parse_list_organizations(&self, response: HttpResponse) -> Result<Vec<Value>, ApiError> {
        into_list(take_key(parse_json(response)?, "organizations")?, "organizations")
    }

    fn collection_url(&self, address: &ResourceAddress) -> String {
        build_url(
            &self.base_url,
            address.parent(),
            Some(&format!("{}/{}", address.parent_id(), address.child())),
        )
    }

    fn entity_url(&self, collection: &str, id: &str) -> Result<String, ApiError> {
        if collection.is_empty() || id.trim().is_empty() {
            return Err(ApiError::InvalidRequest(format!(
                "empty collection or id (`{collection}`/`{id}`)"
            )));
        }
        Ok(build_url(&self.base_url, collection, Some(id)))
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

pub(crate) fn parse_json(response: HttpResponse) -> Result<Value, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

pub(crate) fn take_key(mut body: Value, key: &str) -> Result<Value, ApiError> {
    body.get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ApiError::MissingKey {
            key: key.to_string(),
        })
}

fn into_list(value: Value, key: &str) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ApiError::MalformedResponse(format!(
            "`{key}` should be an array, got {}",
            json_kind(&other)
        ))),
    }
}

fn to_json_body(records: &[Value]) -> Result<String, ApiError> {
    serde_json::to_string(records).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn has_id(record: &Value) -> bool {
    match record.get("id") {
        Some(Value::String(id)) => !id.is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
