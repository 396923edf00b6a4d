//! Ad accounts: owned by an organization, funded by one or more funding
//! sources, parent of campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AdSquad, Campaign, Entity};
use crate::error::ApiError;
use crate::resource::{Collection, ListOptions};
use crate::schema::{FieldKind, FieldSpec, Fields, Schema};
use crate::session::AdsApi;
use crate::transport::Transport;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdAccount {
    pub id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub status: Option<String>,
    pub organization_id: Option<String>,
    pub funding_source_ids: Option<Vec<String>>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub advertiser: Option<String>,
    pub advertiser_organization_id: Option<String>,
    pub billing_type: Option<String>,
    pub billing_center_id: Option<String>,
    pub lifetime_spend_cap_micro: Option<i64>,
    pub paying_advertiser_name: Option<String>,
    pub agency_representing_client: Option<bool>,
    pub client_based_in_country: Option<String>,
    pub client_paying_invoices: Option<bool>,
    pub agency_client_metadata: Option<Value>,
    pub regulations: Option<Value>,
    pub test: Option<bool>,
    pub delivery_status: Option<Value>,
}

impl Entity for AdAccount {
    const SCHEMA: Schema = Schema {
        entity: "AdAccount",
        fields: &[
            FieldSpec::read_only("id", FieldKind::String),
            FieldSpec::read_only("updated_at", FieldKind::Timestamp),
            FieldSpec::read_only("created_at", FieldKind::Timestamp),
            FieldSpec::mutable("name", FieldKind::String),
            FieldSpec::create_only("type", FieldKind::String),
            FieldSpec::read_only("status", FieldKind::String),
            FieldSpec::create_only("organization_id", FieldKind::String),
            FieldSpec::create_only("funding_source_ids", FieldKind::StringList),
            FieldSpec::create_only("currency", FieldKind::String),
            FieldSpec::create_only("timezone", FieldKind::String),
            FieldSpec::mutable("advertiser", FieldKind::String),
            FieldSpec::create_only("advertiser_organization_id", FieldKind::String),
            FieldSpec::create_only("billing_type", FieldKind::String),
            FieldSpec::mutable("billing_center_id", FieldKind::String),
            FieldSpec::mutable("lifetime_spend_cap_micro", FieldKind::Integer),
            FieldSpec::mutable("paying_advertiser_name", FieldKind::String),
            FieldSpec::mutable("agency_representing_client", FieldKind::Boolean),
            FieldSpec::mutable("client_based_in_country", FieldKind::String),
            FieldSpec::mutable("client_paying_invoices", FieldKind::Boolean),
            FieldSpec::mutable("agency_client_metadata", FieldKind::Json),
            // Immutable once set.
            FieldSpec::create_only("regulations", FieldKind::Json),
            FieldSpec::read_only("test", FieldKind::Boolean),
            FieldSpec::read_only("delivery_status", FieldKind::Json),
        ],
    };
    const ENVELOPE: Option<&'static str> = Some("adaccount");
    const PARENT_FIELD: Option<&'static str> = Some("organization_id");

    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> AdsApi<T> {
    pub fn list_ad_accounts(
        &self,
        organization_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<AdAccount>, ApiError> {
        self.list_children(
            Collection::Organizations,
            organization_id,
            Collection::AdAccounts,
            options,
        )
    }

    /// Create several ad accounts under one organization in a single request.
    pub fn create_ad_accounts(
        &self,
        organization_id: &str,
        records: Vec<Fields>,
    ) -> Result<Vec<AdAccount>, ApiError> {
        self.create_children(
            Collection::Organizations,
            organization_id,
            Collection::AdAccounts,
            records,
        )
    }

    pub fn get_ad_account(&self, ad_account_id: &str) -> Result<AdAccount, ApiError> {
        self.get_one(Collection::AdAccounts, ad_account_id)
    }

    /// Apply `changes` to `account` and return the record the server stored.
    pub fn update_ad_account(
        &self,
        account: &AdAccount,
        changes: &Fields,
    ) -> Result<AdAccount, ApiError> {
        self.update_child(Collection::Organizations, Collection::AdAccounts, account, changes)
    }

    pub fn list_campaigns(
        &self,
        ad_account_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Campaign>, ApiError> {
        self.list_children(
            Collection::AdAccounts,
            ad_account_id,
            Collection::Campaigns,
            options,
        )
    }

    /// Every ad squad across all campaigns of the account.
    pub fn list_ad_squads_for_account(
        &self,
        ad_account_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<AdSquad>, ApiError> {
        self.list_children(
            Collection::AdAccounts,
            ad_account_id,
            Collection::AdSquads,
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::AdsClient;
    use crate::schema::FieldProblem;
    use crate::session::Session;
    use crate::testing::MockTransport;

    fn api(transport: MockTransport) -> AdsApi<MockTransport> {
        AdsApi::new(AdsClient::new("https://api.test/v1"), Session::new("tok", transport))
    }

    fn account() -> AdAccount {
        AdAccount::from_json(json!({
            "id": "A1",
            "name": "Main",
            "type": "PARTNER",
            "organization_id": "O1",
            "currency": "USD",
            "timezone": "America/Los_Angeles",
            "funding_source_ids": ["F1"],
            "regulations": {"restricted_delivery_signals": false}
        }))
        .unwrap()
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn regulations_round_trip_verbatim() {
        let value = account().to_json().unwrap();
        assert_eq!(value["regulations"], json!({"restricted_delivery_signals": false}));
        assert_eq!(value["type"], "PARTNER");
    }

    #[test]
    fn update_sends_full_record_with_changes() {
        let transport = MockTransport::new().respond(
            200,
            json!({"adaccounts": [{"sub_request_status": "SUCCESS", "adaccount": {
                "id": "A1", "name": "Renamed", "type": "PARTNER", "organization_id": "O1"
            }}]}),
        );
        let api = api(transport);
        let updated = api
            .update_ad_account(&account(), &fields(json!({"name": "Renamed"})))
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Renamed"));

        let requests = api.session().transport().requests();
        assert_eq!(requests[0].path, "https://api.test/v1/organizations/O1/adaccounts");
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body[0]["id"], "A1");
        assert_eq!(body[0]["name"], "Renamed");
        assert_eq!(body[0]["currency"], "USD");
    }

    #[test]
    fn update_of_create_only_field_is_rejected_locally() {
        let api = api(MockTransport::new());
        let err = api
            .update_ad_account(&account(), &fields(json!({"currency": "EUR", "mood": "happy"})))
            .unwrap_err();
        match err {
            ApiError::Validation(e) => {
                assert!(e.problems.contains(&FieldProblem::NotUpdatable("currency".to_string())));
                assert!(e.problems.contains(&FieldProblem::Unknown("mood".to_string())));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.session().transport().call_count(), 0);
    }

    #[test]
    fn update_without_organization_is_rejected() {
        let mut account = account();
        account.organization_id = None;
        let api = api(MockTransport::new());
        let err = api
            .update_ad_account(&account, &fields(json!({"name": "x"})))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn create_ad_accounts_posts_every_record() {
        let transport = MockTransport::new().respond(
            200,
            json!({"adaccounts": [
                {"sub_request_status": "SUCCESS", "adaccount": {"id": "A1", "name": "One", "organization_id": "O1"}},
                {"sub_request_status": "SUCCESS", "adaccount": {"id": "A2", "name": "Two", "organization_id": "O1"}}
            ]}),
        );
        let api = api(transport);
        let created = api
            .create_ad_accounts(
                "O1",
                vec![
                    fields(json!({"name": "One", "organization_id": "O1"})),
                    fields(json!({"name": "Two", "organization_id": "O1"})),
                ],
            )
            .unwrap();
        assert_eq!(created.len(), 2);
        let body: Value =
            serde_json::from_str(api.session().transport().requests()[0].body.as_deref().unwrap())
                .unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[test]
    fn list_campaigns_forwards_deleted_filter() {
        let transport = MockTransport::new().respond(200, json!({"campaigns": []}));
        let api = api(transport);
        api.list_campaigns("A1", &ListOptions::new().read_deleted_entities(true))
            .unwrap();
        assert_eq!(
            api.session().transport().requests()[0].url(),
            "https://api.test/v1/adaccounts/A1/campaigns?read_deleted_entities=true"
        );
    }
}
