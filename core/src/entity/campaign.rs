//! Campaigns: owned by an ad account, parent of ad squads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AdSquad, Entity};
use crate::error::ApiError;
use crate::resource::{Collection, ListOptions};
use crate::schema::{FieldKind, FieldSpec, Fields, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub ad_account_id: Option<String>,
    pub status: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub daily_budget_micro: Option<i64>,
    pub lifetime_spend_cap_micro: Option<i64>,
    pub measurement_spec: Option<Value>,
    pub objective: Option<String>,
    pub buy_model: Option<String>,
    pub regulations: Option<Value>,
    pub delivery_status: Option<Value>,
    pub deleted: Option<bool>,
}

impl Entity for Campaign {
    const SCHEMA: Schema = Schema {
        entity: "Campaign",
        fields: &[
            FieldSpec::read_only("id", FieldKind::String),
            FieldSpec::read_only("updated_at", FieldKind::Timestamp),
            FieldSpec::read_only("created_at", FieldKind::Timestamp),
            FieldSpec::mutable("name", FieldKind::String),
            FieldSpec::create_only("ad_account_id", FieldKind::String),
            FieldSpec::mutable("status", FieldKind::String),
            FieldSpec::mutable("start_time", FieldKind::Timestamp),
            FieldSpec::mutable("end_time", FieldKind::Timestamp),
            FieldSpec::mutable("daily_budget_micro", FieldKind::Integer),
            FieldSpec::mutable("lifetime_spend_cap_micro", FieldKind::Integer),
            FieldSpec::create_only("measurement_spec", FieldKind::Json),
            FieldSpec::create_only("objective", FieldKind::String),
            FieldSpec::create_only("buy_model", FieldKind::String),
            FieldSpec::create_only("regulations", FieldKind::Json),
            FieldSpec::read_only("delivery_status", FieldKind::Json),
            FieldSpec::read_only("deleted", FieldKind::Boolean),
        ],
    };
    const ENVELOPE: Option<&'static str> = Some("campaign");
    const PARENT_FIELD: Option<&'static str> = Some("ad_account_id");

    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> AdsApi<T> {
    /// Create campaigns under one ad account. Records without
    /// `ad_account_id` get the account's id.
    pub fn create_campaigns(
        &self,
        ad_account_id: &str,
        records: Vec<Fields>,
    ) -> Result<Vec<Campaign>, ApiError> {
        self.create_children(
            Collection::AdAccounts,
            ad_account_id,
            Collection::Campaigns,
            records,
        )
    }

    pub fn get_campaign(&self, campaign_id: &str) -> Result<Campaign, ApiError> {
        self.get_one(Collection::Campaigns, campaign_id)
    }

    pub fn update_campaign(
        &self,
        campaign: &Campaign,
        changes: &Fields,
    ) -> Result<Campaign, ApiError> {
        self.update_child(Collection::AdAccounts, Collection::Campaigns, campaign, changes)
    }

    pub fn delete_campaign(&self, campaign: &Campaign) -> Result<(), ApiError> {
        self.delete_entity(Collection::Campaigns.plural(), &campaign.id)
    }

    pub fn list_ad_squads(
        &self,
        campaign_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<AdSquad>, ApiError> {
        self.list_children(
            Collection::Campaigns,
            campaign_id,
            Collection::AdSquads,
            options,
        )
    }

    /// Create ad squads under one campaign. Records without `campaign_id`
    /// get the campaign's id.
    pub fn create_ad_squads(
        &self,
        campaign_id: &str,
        records: Vec<Fields>,
    ) -> Result<Vec<AdSquad>, ApiError> {
        self.create_children(
            Collection::Campaigns,
            campaign_id,
            Collection::AdSquads,
            records,
        )
    }
}
