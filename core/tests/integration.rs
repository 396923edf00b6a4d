//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port, then drives the
//! public `AdsApi` over real HTTP through `UreqTransport`. This checks that
//! URL building, bearer auth, envelopes and cursor pagination agree with an
//! actual server rather than with hand-written responses.

use std::net::SocketAddr;

use serde_json::{json, Value};
use snapads_core::{
    refresh_access_token, AdsApi, AdsClient, ApiError, Entity, Fields, ListOptions,
    RefreshCredentials, Session, UreqTransport,
};
use snapads_mock_server::{
    ACCESS_TOKEN, AD_ACCOUNT_ID, CLIENT_ID, CLIENT_SECRET, ORGANIZATION_ID, REFRESH_TOKEN, USER_ID,
};

fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            snapads_mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn api_for(addr: SocketAddr, token: &str) -> AdsApi {
    AdsApi::new(
        AdsClient::new(&format!("http://{addr}/v1")),
        Session::new(token, UreqTransport::default()),
    )
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

#[test]
fn hierarchy_lifecycle() {
    let addr = spawn_server();
    let api = api_for(addr, ACCESS_TOKEN);

    // Step 1: who am I, and what can I reach.
    let me = api.get_authenticated_user().unwrap();
    assert_eq!(me.id, USER_ID);
    assert_eq!(me.organization_id.as_deref(), Some(ORGANIZATION_ID));

    let orgs = api.list_organizations_with_ad_accounts().unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].0.id, ORGANIZATION_ID);
    assert_eq!(orgs[0].1[0].id, AD_ACCOUNT_ID);

    let accounts = api
        .list_ad_accounts(ORGANIZATION_ID, &ListOptions::new())
        .unwrap();
    assert_eq!(accounts.len(), 1);
    let account = api.get_ad_account(AD_ACCOUNT_ID).unwrap();
    assert_eq!(account.currency.as_deref(), Some("USD"));

    // Step 2: five campaigns, read back two per page.
    let records = (1..=5)
        .map(|n| {
            fields(json!({
                "name": format!("campaign {n}"),
                "status": if n % 2 == 0 { "PAUSED" } else { "ACTIVE" },
                "start_time": "2024-03-01T00:00:00.000Z",
            }))
        })
        .collect();
    let created = api.create_campaigns(AD_ACCOUNT_ID, records).unwrap();
    assert_eq!(created.len(), 5);
    assert!(created
        .iter()
        .all(|c| c.ad_account_id.as_deref() == Some(AD_ACCOUNT_ID)));

    let paged = api
        .list_campaigns(AD_ACCOUNT_ID, &ListOptions::new().limit(2))
        .unwrap();
    let names: Vec<&str> = paged.iter().filter_map(|c| c.name.as_deref()).collect();
    assert_eq!(
        names,
        vec!["campaign 1", "campaign 2", "campaign 3", "campaign 4", "campaign 5"]
    );

    let paused = api
        .list_campaigns(
            AD_ACCOUNT_ID,
            &ListOptions::new().limit(1).filter("status", "PAUSED"),
        )
        .unwrap();
    assert_eq!(paused.len(), 2);

    // Step 3: update and re-read one campaign.
    let campaign = api.get_campaign(&created[0].id).unwrap();
    let updated = api
        .update_campaign(&campaign, &fields(json!({"daily_budget_micro": 25_000_000})))
        .unwrap();
    assert_eq!(updated.id, campaign.id);
    assert_eq!(updated.daily_budget_micro, Some(25_000_000));
    assert_eq!(updated.name, campaign.name);

    // Step 4: an ad squad with an ad under the campaign.
    let squads = api
        .create_ad_squads(
            &campaign.id,
            vec![fields(json!({
                "name": "squad",
                "type": "SNAP_ADS",
                "status": "ACTIVE",
                "bid_micro": 1_000_000,
                "billing_event": "IMPRESSION",
                "optimization_goal": "SWIPES",
                "daily_budget_micro": 50_000_000,
                "placement_v2": {"config": "AUTOMATIC"},
                "targeting": {"geos": [{"country_code": "us"}]},
            }))],
        )
        .unwrap();
    let squad = &squads[0];
    assert_eq!(squad.campaign_id.as_deref(), Some(campaign.id.as_str()));
    assert_eq!(squad.targeting, Some(json!({"geos": [{"country_code": "us"}]})));

    let across_account = api
        .list_ad_squads_for_account(AD_ACCOUNT_ID, &ListOptions::new())
        .unwrap();
    assert_eq!(across_account.len(), 1);

    let ads = api
        .create_ads(
            &squad.id,
            vec![fields(json!({
                "name": "ad",
                "creative_id": "creative-1",
                "status": "ACTIVE",
                "type": "SNAP_AD",
            }))],
        )
        .unwrap();
    let ad = api.get_ad(&ads[0].id).unwrap();
    assert_eq!(ad.creative_id.as_deref(), Some("creative-1"));
    assert_eq!(api.list_ads(&squad.id, &ListOptions::new()).unwrap().len(), 1);

    // Step 5: tear down bottom-up.
    api.delete_ad(&ad).unwrap();
    api.delete_ad_squad(squad).unwrap();
    api.delete_campaign(&campaign).unwrap();
    assert!(matches!(api.get_ad(&ad.id), Err(ApiError::NotFound)));
    assert!(matches!(api.get_campaign(&campaign.id), Err(ApiError::NotFound)));
    assert!(matches!(api.delete_campaign(&campaign), Err(ApiError::NotFound)));

    let remaining = api
        .list_campaigns(AD_ACCOUNT_ID, &ListOptions::new())
        .unwrap();
    assert_eq!(remaining.len(), 4);
    let with_deleted = api
        .list_campaigns(AD_ACCOUNT_ID, &ListOptions::new().read_deleted_entities(true))
        .unwrap();
    assert_eq!(with_deleted.len(), 5);
    assert!(with_deleted
        .iter()
        .any(|c| c.id == campaign.id && c.deleted == Some(true)));
}

#[test]
fn page_ceiling_stops_long_chain() {
    let addr = spawn_server();
    let api = api_for(addr, ACCESS_TOKEN);

    let records = (0..3)
        .map(|n| fields(json!({"name": format!("c{n}"), "status": "ACTIVE"})))
        .collect();
    api.create_campaigns(AD_ACCOUNT_ID, records).unwrap();

    let err = api
        .list_campaigns(AD_ACCOUNT_ID, &ListOptions::new().limit(1).max_pages(2))
        .unwrap_err();
    assert!(matches!(err, ApiError::PageLimitExceeded { max_pages: 2 }));
}

#[test]
fn rejected_token_surfaces_status() {
    let addr = spawn_server();
    let api = api_for(addr, "expired");

    match api.get_authenticated_user() {
        Err(ApiError::Http { status: 401, .. }) => {}
        other => panic!("expected 401, got {other:?}"),
    }
}

#[test]
fn refreshed_token_replaces_expired_one() {
    let addr = spawn_server();
    let mut api = api_for(addr, "expired");
    assert!(api.get_organization(ORGANIZATION_ID).is_err());

    let credentials = RefreshCredentials::new(CLIENT_ID, CLIENT_SECRET, REFRESH_TOKEN)
        .with_token_url(format!("http://{addr}/login/oauth2/access_token"));
    let token = refresh_access_token(api.session().transport(), &credentials).unwrap();
    assert_ne!(token, ACCESS_TOKEN);

    api.set_access_token(token);
    let org = api.get_organization(ORGANIZATION_ID).unwrap();
    assert_eq!(org.id, ORGANIZATION_ID);
    assert_eq!(org.to_json().unwrap()["type"], "ENTERPRISE");
}

#[test]
fn refresh_with_wrong_secret_fails() {
    let addr = spawn_server();
    let credentials = RefreshCredentials::new(CLIENT_ID, "wrong", REFRESH_TOKEN)
        .with_token_url(format!("http://{addr}/login/oauth2/access_token"));

    let err = refresh_access_token(&UreqTransport::default(), &credentials).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400, .. }));
}
