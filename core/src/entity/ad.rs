//! Ads: the displayable unit under an ad squad, pointing at a creative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Entity;
use crate::error::ApiError;
use crate::resource::Collection;
use crate::schema::{FieldKind, FieldSpec, Fields, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub ad_squad_id: Option<String>,
    pub creative_id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    /// Inherited from the ad account.
    pub paying_advertiser_name: Option<String>,
    pub review_status: Option<String>,
    pub review_status_reasons: Option<Value>,
    pub delivery_status: Option<Value>,
    pub deleted: Option<bool>,
}

impl Entity for Ad {
    const SCHEMA: Schema = Schema {
        entity: "Ad",
        fields: &[
            FieldSpec::read_only("id", FieldKind::String),
            FieldSpec::read_only("updated_at", FieldKind::Timestamp),
            FieldSpec::read_only("created_at", FieldKind::Timestamp),
            FieldSpec::create_only("ad_squad_id", FieldKind::String),
            FieldSpec::mutable("creative_id", FieldKind::String),
            FieldSpec::mutable("name", FieldKind::String),
            FieldSpec::mutable("status", FieldKind::String),
            FieldSpec::create_only("type", FieldKind::String),
            FieldSpec::read_only("paying_advertiser_name", FieldKind::String),
            FieldSpec::read_only("review_status", FieldKind::String),
            FieldSpec::read_only("review_status_reasons", FieldKind::Json),
            FieldSpec::read_only("delivery_status", FieldKind::Json),
            FieldSpec::read_only("deleted", FieldKind::Boolean),
        ],
    };
    const ENVELOPE: Option<&'static str> = Some("ad");
    const PARENT_FIELD: Option<&'static str> = Some("ad_squad_id");

    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> AdsApi<T> {
    pub fn get_ad(&self, ad_id: &str) -> Result<Ad, ApiError> {
        self.get_one(Collection::Ads, ad_id)
    }

    pub fn update_ad(&self, ad: &Ad, changes: &Fields) -> Result<Ad, ApiError> {
        self.update_child(Collection::AdSquads, Collection::Ads, ad, changes)
    }

    pub fn delete_ad(&self, ad: &Ad) -> Result<(), ApiError> {
        self.delete_entity(Collection::Ads.plural(), &ad.id)
    }
}
