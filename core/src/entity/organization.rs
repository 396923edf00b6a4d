//! Organizations: the brand, partner or agency that owns ad accounts.
//! They are created through the business UI, so the API only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{decode_all, AdAccount, Entity};
use crate::error::ApiError;
use crate::resource::Collection;
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub address_line_1: Option<String>,
    pub locality: Option<String>,
    pub administration_district_level_1: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    #[serde(rename = "type")]
    pub org_type: Option<String>,
    pub state: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub accepted_term_version: Option<String>,
    pub configuration_settings: Option<Value>,
    pub my_display_name: Option<String>,
    pub my_invited_email: Option<String>,
    pub my_member_id: Option<String>,
    pub roles: Option<Vec<String>>,
}

impl Entity for Organization {
    const SCHEMA: Schema = Schema {
        entity: "Organization",
        fields: &[
            FieldSpec::read_only("id", FieldKind::String),
            FieldSpec::read_only("updated_at", FieldKind::Timestamp),
            FieldSpec::read_only("created_at", FieldKind::Timestamp),
            FieldSpec::read_only("name", FieldKind::String),
            FieldSpec::read_only("address_line_1", FieldKind::String),
            FieldSpec::read_only("locality", FieldKind::String),
            FieldSpec::read_only("administration_district_level_1", FieldKind::String),
            FieldSpec::read_only("country", FieldKind::String),
            FieldSpec::read_only("postal_code", FieldKind::String),
            FieldSpec::read_only("type", FieldKind::String),
            FieldSpec::read_only("state", FieldKind::String),
            FieldSpec::read_only("contact_name", FieldKind::String),
            FieldSpec::read_only("contact_email", FieldKind::String),
            FieldSpec::read_only("contact_phone", FieldKind::String),
            FieldSpec::read_only("accepted_term_version", FieldKind::String),
            FieldSpec::read_only("configuration_settings", FieldKind::Json),
            FieldSpec::read_only("my_display_name", FieldKind::String),
            FieldSpec::read_only("my_invited_email", FieldKind::String),
            FieldSpec::read_only("my_member_id", FieldKind::String),
            FieldSpec::read_only("roles", FieldKind::StringList),
        ],
    };
    const ENVELOPE: Option<&'static str> = Some("organization");

    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> AdsApi<T> {
    /// Organizations the authenticated user can access.
    pub fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        let request = self.client().build_list_organizations(false);
        let items = self.client().parse_list_organizations(self.execute(request)?)?;
        decode_all(items)
    }

    /// Organizations paired with the ad accounts embedded in each of them.
    pub fn list_organizations_with_ad_accounts(
        &self,
    ) -> Result<Vec<(Organization, Vec<AdAccount>)>, ApiError> {
        let request = self.client().build_list_organizations(true);
        let items = self.client().parse_list_organizations(self.execute(request)?)?;

        items
            .into_iter()
            .map(|item| {
                let mut record = super::unwrap_envelope(item, "organization")?;
                let accounts = match record.as_object_mut().and_then(|o| o.remove("ad_accounts")) {
                    Some(Value::Array(accounts)) => accounts,
                    Some(Value::Null) | None => Vec::new(),
                    Some(_) => {
                        return Err(ApiError::MalformedResponse(
                            "`ad_accounts` should be an array".to_string(),
                        ))
                    }
                };
                let organization = Organization::from_json(record)?;
                debug!(organization = %organization.id, accounts = accounts.len(), "organization with ad accounts");
                Ok((organization, decode_all(accounts)?))
            })
            .collect()
    }

    pub fn get_organization(&self, organization_id: &str) -> Result<Organization, ApiError> {
        self.get_one(Collection::Organizations, organization_id)
    }
}
