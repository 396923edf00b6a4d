//! Ad squads: owned by a campaign, carry targeting, bidding and budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Ad, Entity};
use crate::error::ApiError;
use crate::resource::{Collection, ListOptions};
use crate::schema::{FieldKind, FieldSpec, Fields, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSquad {
    pub id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub campaign_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub squad_type: Option<String>,
    pub status: Option<String>,
    pub bid_micro: Option<i64>,
    pub bid_strategy: Option<String>,
    pub billing_event: Option<String>,
    pub optimization_goal: Option<String>,
    pub child_ad_type: Option<String>,
    pub forced_view_setting: Option<String>,
    /// One of this or `lifetime_budget_micro` must be set.
    pub daily_budget_micro: Option<i64>,
    pub lifetime_budget_micro: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub placement_v2: Option<Value>,
    pub targeting: Option<Value>,
    pub story_ad_creative_type: Option<String>,
    pub cap_and_exclusion_config: Option<Value>,
    pub ad_scheduling_config: Option<Value>,
    /// Required when `bid_strategy` is `MIN_ROAS`.
    pub roas_value_micro: Option<i64>,
    pub pixel_id: Option<String>,
    pub measurement_provider_names: Option<Vec<String>>,
    pub reach_and_frequency_status: Option<String>,
    pub reach_goal: Option<i64>,
    pub impression_goal: Option<i64>,
    pub delivery_constraint: Option<String>,
    pub pacing_type: Option<String>,
    pub event_sources: Option<Value>,
    pub included_content_types: Option<Vec<String>>,
    pub excluded_content_types: Option<Vec<String>>,
    pub skadnetwork_properties: Option<Value>,
    pub delivery_status: Option<Value>,
    pub deleted: Option<bool>,
}

impl Entity for AdSquad {
    const SCHEMA: Schema = Schema {
        entity: "AdSquad",
        fields: &[
            FieldSpec::read_only("id", FieldKind::String),
            FieldSpec::read_only("updated_at", FieldKind::Timestamp),
            FieldSpec::read_only("created_at", FieldKind::Timestamp),
            FieldSpec::create_only("campaign_id", FieldKind::String),
            FieldSpec::mutable("name", FieldKind::String),
            FieldSpec::create_only("type", FieldKind::String),
            FieldSpec::mutable("status", FieldKind::String),
            FieldSpec::mutable("bid_micro", FieldKind::Integer),
            FieldSpec::mutable("bid_strategy", FieldKind::String),
            FieldSpec::create_only("billing_event", FieldKind::String),
            FieldSpec::create_only("optimization_goal", FieldKind::String),
            FieldSpec::create_only("child_ad_type", FieldKind::String),
            FieldSpec::create_only("forced_view_setting", FieldKind::String),
            FieldSpec::mutable("daily_budget_micro", FieldKind::Integer),
            FieldSpec::mutable("lifetime_budget_micro", FieldKind::Integer),
            FieldSpec::create_only("start_time", FieldKind::Timestamp),
            FieldSpec::mutable("end_time", FieldKind::Timestamp),
            FieldSpec::create_only("placement_v2", FieldKind::Json),
            FieldSpec::mutable("targeting", FieldKind::Json),
            FieldSpec::create_only("story_ad_creative_type", FieldKind::String),
            FieldSpec::mutable("cap_and_exclusion_config", FieldKind::Json),
            FieldSpec::create_only("ad_scheduling_config", FieldKind::Json),
            FieldSpec::mutable("roas_value_micro", FieldKind::Integer),
            FieldSpec::mutable("pixel_id", FieldKind::String),
            FieldSpec::create_only("measurement_provider_names", FieldKind::StringList),
            FieldSpec::create_only("reach_and_frequency_status", FieldKind::String),
            FieldSpec::create_only("reach_goal", FieldKind::Integer),
            FieldSpec::create_only("impression_goal", FieldKind::Integer),
            FieldSpec::read_only("delivery_constraint", FieldKind::String),
            FieldSpec::mutable("pacing_type", FieldKind::String),
            // Required for SKAdNetwork squads.
            FieldSpec::create_only("event_sources", FieldKind::Json),
            FieldSpec::mutable("included_content_types", FieldKind::StringList),
            FieldSpec::mutable("excluded_content_types", FieldKind::StringList),
            FieldSpec::read_only("skadnetwork_properties", FieldKind::Json),
            FieldSpec::read_only("delivery_status", FieldKind::Json),
            FieldSpec::read_only("deleted", FieldKind::Boolean),
        ],
    };
    const ENVELOPE: Option<&'static str> = Some("adsquad");
    const PARENT_FIELD: Option<&'static str> = Some("campaign_id");

    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> AdsApi<T> {
    pub fn get_ad_squad(&self, ad_squad_id: &str) -> Result<AdSquad, ApiError> {
        self.get_one(Collection::AdSquads, ad_squad_id)
    }

    pub fn update_ad_squad(&self, squad: &AdSquad, changes: &Fields) -> Result<AdSquad, ApiError> {
        self.update_child(Collection::Campaigns, Collection::AdSquads, squad, changes)
    }

    pub fn delete_ad_squad(&self, squad: &AdSquad) -> Result<(), ApiError> {
        self.delete_entity(Collection::AdSquads.plural(), &squad.id)
    }

    pub fn list_ads(&self, ad_squad_id: &str, options: &ListOptions) -> Result<Vec<Ad>, ApiError> {
        self.list_children(Collection::AdSquads, ad_squad_id, Collection::Ads, options)
    }

    /// Create ads under one ad squad. Records without `ad_squad_id` get the
    /// squad's id.
    pub fn create_ads(&self, ad_squad_id: &str, records: Vec<Fields>) -> Result<Vec<Ad>, ApiError> {
        self.create_children(Collection::AdSquads, ad_squad_id, Collection::Ads, records)
    }
}
