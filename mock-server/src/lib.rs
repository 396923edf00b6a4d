//! In-memory stand-in for the ads API, used by the client's integration
//! tests and runnable on its own.
//!
//! It serves the nested collection layout (`/v1/{parent}/{id}/{child}`),
//! single entities (`/v1/{collection}/{id}`), the caller-scoped `/v1/me`
//! endpoints and the OAuth2 refresh endpoint. Every `/v1` route requires a
//! bearer token the store knows about. Lists honour `limit` by returning one
//! page at a time with an absolute `paging.next_link`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::{Path, Query, RawQuery, Request, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const ACCESS_TOKEN: &str = "mock-access-token";
pub const CLIENT_ID: &str = "mock-client-id";
pub const CLIENT_SECRET: &str = "mock-client-secret";
pub const REFRESH_TOKEN: &str = "mock-refresh-token";
pub const USER_ID: &str = "user-0001";
pub const ORGANIZATION_ID: &str = "org-0001";
pub const AD_ACCOUNT_ID: &str = "acct-0001";

const MAX_LIMIT: usize = 1000;
const RESERVED_PARAMS: [&str; 4] = ["limit", "cursor", "read_deleted_entities", "return_placement_v2"];
const DELETABLE: [&str; 3] = ["campaigns", "adsquads", "ads"];

pub type Record = Map<String, Value>;

/// Everything the server knows: accepted tokens, the caller, and the
/// entities of each collection in creation order.
#[derive(Debug, Default)]
pub struct Store {
    tokens: HashSet<String>,
    me: Record,
    collections: HashMap<String, Vec<Record>>,
}

impl Store {
    /// One user, one organization and one ad account, accepting
    /// [`ACCESS_TOKEN`].
    pub fn seeded() -> Self {
        let now = timestamp();
        let mut store = Store::default();
        store.tokens.insert(ACCESS_TOKEN.to_string());
        store.me = object(json!({
            "id": USER_ID,
            "updated_at": now,
            "created_at": now,
            "email": "mock@example.com",
            "organization_id": ORGANIZATION_ID,
            "display_name": "Mock User",
            "member_status": "ACTIVE",
        }));
        store.insert(
            "organizations",
            object(json!({
                "id": ORGANIZATION_ID,
                "updated_at": now,
                "created_at": now,
                "name": "Mock Organization",
                "country": "US",
                "postal_code": "90291",
                "type": "ENTERPRISE",
                "state": "ACTIVE",
            })),
        );
        store.insert(
            "adaccounts",
            object(json!({
                "id": AD_ACCOUNT_ID,
                "updated_at": now,
                "created_at": now,
                "name": "Mock Account",
                "type": "PARTNER",
                "status": "ACTIVE",
                "organization_id": ORGANIZATION_ID,
                "funding_source_ids": ["fs-0001"],
                "currency": "USD",
                "timezone": "America/Los_Angeles",
            })),
        );
        store
    }

    pub fn insert(&mut self, collection: &str, record: Record) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    fn records<'a>(&'a self, collection: &str) -> impl Iterator<Item = &'a Record> + 'a {
        self.collections.get(collection).into_iter().flatten()
    }

    fn find(&self, collection: &str, id: &str) -> Option<&Record> {
        self.records(collection).find(|r| field_is(r, "id", id))
    }

    fn find_mut(&mut self, collection: &str, id: &str) -> Option<&mut Record> {
        self.collections
            .get_mut(collection)?
            .iter_mut()
            .find(|r| field_is(r, "id", id))
    }

    /// Children of one parent, in creation order.
    fn children(&self, parent: &str, parent_id: &str, child: &str) -> Result<Vec<&Record>, Failure> {
        if self.find(parent, parent_id).is_none() {
            return Err(Failure::not_found(format!("{parent}/{parent_id}")));
        }
        // Ad squads are also listed per ad account, across its campaigns.
        if (parent, child) == ("adaccounts", "adsquads") {
            let campaigns: HashSet<&str> = self
                .records("campaigns")
                .filter(|c| field_is(c, "ad_account_id", parent_id))
                .filter_map(|c| c.get("id").and_then(Value::as_str))
                .collect();
            return Ok(self
                .records("adsquads")
                .filter(|s| {
                    s.get("campaign_id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| campaigns.contains(id))
                })
                .collect());
        }
        let field = parent_field(parent, child)
            .ok_or_else(|| Failure::not_found(format!("{parent}/{parent_id}/{child}")))?;
        Ok(self
            .records(child)
            .filter(|r| field_is(r, field, parent_id))
            .collect())
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error reply in the API's `request_status` shape.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "request_status": "ERROR",
            "request_id": Uuid::new_v4().to_string(),
            "debug_message": self.message,
            "display_message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type Reply = Result<Json<Value>, Failure>;

pub fn app() -> Router {
    app_with_store(Store::seeded())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/v1/me", get(get_me))
        .route("/v1/me/organizations", get(list_my_organizations))
        .route("/v1/{collection}/{id}", get(get_entity).delete(delete_entity))
        .route(
            "/v1/{parent}/{parent_id}/{child}",
            get(list_children).post(create_children).put(update_children),
        )
        .route_layer(middleware::from_fn_with_state(db.clone(), require_bearer));

    Router::new()
        .route("/login/oauth2/access_token", post(refresh_token))
        .merge(api)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_bearer(State(db): State<Db>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);
    let authorized = match token {
        Some(token) => db.read().await.tokens.contains(&token),
        None => false,
    };
    if !authorized {
        warn!(uri = %request.uri(), "rejected request without a valid bearer token");
        return Failure::new(StatusCode::UNAUTHORIZED, "invalid or missing access token")
            .into_response();
    }
    next.run(request).await
}

async fn get_me(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    Json(json!({
        "request_status": "SUCCESS",
        "request_id": Uuid::new_v4().to_string(),
        "me": store.me,
    }))
}

#[derive(Debug, Deserialize)]
struct OrganizationParams {
    #[serde(default)]
    with_ad_accounts: bool,
}

async fn list_my_organizations(
    State(db): State<Db>,
    Query(params): Query<OrganizationParams>,
) -> Json<Value> {
    let store = db.read().await;
    let organizations = store
        .records("organizations")
        .map(|org| {
            let mut org = org.clone();
            if params.with_ad_accounts {
                let id = org.get("id").and_then(Value::as_str).unwrap_or_default();
                let accounts: Vec<Value> = store
                    .records("adaccounts")
                    .filter(|a| field_is(a, "organization_id", id))
                    .map(|a| Value::Object(a.clone()))
                    .collect();
                org.insert("ad_accounts".to_string(), Value::Array(accounts));
            }
            envelope("organization", org)
        })
        .collect();
    Json(collection_body("organizations", organizations, None))
}

async fn get_entity(State(db): State<Db>, Path((collection, id)): Path<(String, String)>) -> Reply {
    let singular = singular(&collection).ok_or_else(|| Failure::not_found(&collection))?;
    let store = db.read().await;
    let record = store
        .find(&collection, &id)
        .filter(|r| !is_deleted(r))
        .ok_or_else(|| Failure::not_found(format!("{collection}/{id}")))?;
    debug!(%collection, %id, "get entity");
    Ok(Json(collection_body(
        &collection,
        vec![envelope(singular, record.clone())],
        None,
    )))
}

async fn delete_entity(State(db): State<Db>, Path((collection, id)): Path<(String, String)>) -> Reply {
    if !DELETABLE.contains(&collection.as_str()) {
        return Err(Failure::bad_request(format!("{collection} cannot be deleted")));
    }
    let mut store = db.write().await;
    let record = store
        .find_mut(&collection, &id)
        .filter(|r| !is_deleted(r))
        .ok_or_else(|| Failure::not_found(format!("{collection}/{id}")))?;
    record.insert("deleted".to_string(), Value::Bool(true));
    record.insert("updated_at".to_string(), Value::String(timestamp()));
    info!(%collection, %id, "deleted entity");
    Ok(Json(json!({
        "request_status": "SUCCESS",
        "request_id": Uuid::new_v4().to_string(),
    })))
}

async fn list_children(
    State(db): State<Db>,
    Path((parent, parent_id, child)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
) -> Reply {
    let singular = singular(&child).ok_or_else(|| Failure::not_found(&child))?;
    let read_deleted = params.get("read_deleted_entities").is_some_and(|v| v == "true");
    let limit = match params.get("limit") {
        Some(raw) => Some(parse_bounded(raw, "limit", 1, MAX_LIMIT)?),
        None => None,
    };
    let cursor = match params.get("cursor") {
        Some(raw) => parse_bounded(raw, "cursor", 0, usize::MAX)?,
        None => 0,
    };

    let store = db.read().await;
    let matching: Vec<&Record> = store
        .children(&parent, &parent_id, &child)?
        .into_iter()
        .filter(|r| read_deleted || !is_deleted(r))
        .filter(|r| matches_filters(r, &params))
        .collect();

    let (start, end) = match limit {
        Some(limit) => (
            cursor.min(matching.len()),
            cursor.saturating_add(limit).min(matching.len()),
        ),
        None => (0, matching.len()),
    };
    let next_link = (limit.is_some() && end < matching.len())
        .then(|| next_link(&headers, &uri, raw_query.as_deref(), end));
    debug!(%parent, %parent_id, %child, start, end, total = matching.len(), "list page");

    let items = matching[start..end]
        .iter()
        .map(|r| envelope(singular, (*r).clone()))
        .collect();
    Ok(Json(collection_body(&child, items, next_link)))
}

async fn create_children(
    State(db): State<Db>,
    Path((parent, parent_id, child)): Path<(String, String, String)>,
    Json(records): Json<Vec<Value>>,
) -> Reply {
    let singular = singular(&child).ok_or_else(|| Failure::not_found(&child))?;
    let field = parent_field(&parent, &child)
        .ok_or_else(|| Failure::not_found(format!("{parent}/{parent_id}/{child}")))?;
    if records.is_empty() {
        return Err(Failure::bad_request("no records"));
    }

    let mut store = db.write().await;
    if store.find(&parent, &parent_id).is_none() {
        return Err(Failure::not_found(format!("{parent}/{parent_id}")));
    }

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let Value::Object(mut record) = record else {
            return Err(Failure::bad_request("records must be objects"));
        };
        let parent_ok = match record.get(field) {
            None => {
                record.insert(field.to_string(), Value::String(parent_id.clone()));
                true
            }
            Some(value) => value.as_str() == Some(parent_id.as_str()),
        };
        if !parent_ok {
            items.push(sub_request_error(
                singular,
                record,
                format!("{field} does not match {parent}/{parent_id}"),
            ));
            continue;
        }

        let now = timestamp();
        record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        record.insert("created_at".to_string(), Value::String(now.clone()));
        record.insert("updated_at".to_string(), Value::String(now));
        info!(collection = %child, id = ?record.get("id"), "created entity");
        store.insert(&child, record.clone());
        items.push(envelope(singular, record));
    }
    Ok(Json(collection_body(&child, items, None)))
}

async fn update_children(
    State(db): State<Db>,
    Path((parent, parent_id, child)): Path<(String, String, String)>,
    Json(records): Json<Vec<Value>>,
) -> Reply {
    let singular = singular(&child).ok_or_else(|| Failure::not_found(&child))?;
    let field = parent_field(&parent, &child)
        .ok_or_else(|| Failure::not_found(format!("{parent}/{parent_id}/{child}")))?;
    if records.is_empty() {
        return Err(Failure::bad_request("no records"));
    }

    let mut store = db.write().await;
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let Value::Object(changes) = record else {
            return Err(Failure::bad_request("records must be objects"));
        };
        let id = changes
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(stored) = store
            .find_mut(&child, &id)
            .filter(|r| field_is(r, field, &parent_id) && !is_deleted(r))
        else {
            items.push(sub_request_error(
                singular,
                changes,
                format!("{child}/{id} not found under {parent}/{parent_id}"),
            ));
            continue;
        };
        for (key, value) in changes {
            if !matches!(key.as_str(), "id" | "created_at") {
                stored.insert(key, value);
            }
        }
        stored.insert("updated_at".to_string(), Value::String(timestamp()));
        info!(collection = %child, %id, "updated entity");
        items.push(envelope(singular, stored.clone()));
    }
    Ok(Json(collection_body(&child, items, None)))
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    client_id: String,
    client_secret: String,
    grant_type: String,
    refresh_token: String,
}

async fn refresh_token(State(db): State<Db>, Form(form): Form<TokenRequest>) -> Response {
    let valid = form.client_id == CLIENT_ID
        && form.client_secret == CLIENT_SECRET
        && form.grant_type == "refresh_token"
        && form.refresh_token == REFRESH_TOKEN;
    if !valid {
        warn!(client_id = %form.client_id, "refused token refresh");
        let body = json!({"error": "invalid_grant"});
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let token = Uuid::new_v4().to_string();
    db.write().await.tokens.insert(token.clone());
    info!(client_id = %form.client_id, "issued access token");
    Json(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": 1800,
        "refresh_token": REFRESH_TOKEN,
        "scope": "snapchat-marketing-api",
    }))
    .into_response()
}

fn singular(collection: &str) -> Option<&'static str> {
    match collection {
        "organizations" => Some("organization"),
        "adaccounts" => Some("adaccount"),
        "campaigns" => Some("campaign"),
        "adsquads" => Some("adsquad"),
        "ads" => Some("ad"),
        _ => None,
    }
}

/// Field of `child` records that points at their `parent`.
fn parent_field(parent: &str, child: &str) -> Option<&'static str> {
    match (parent, child) {
        ("organizations", "adaccounts") => Some("organization_id"),
        ("adaccounts", "campaigns") => Some("ad_account_id"),
        ("campaigns", "adsquads") => Some("campaign_id"),
        ("adsquads", "ads") => Some("ad_squad_id"),
        _ => None,
    }
}

fn field_is(record: &Record, field: &str, expected: &str) -> bool {
    record.get(field).and_then(Value::as_str) == Some(expected)
}

fn is_deleted(record: &Record) -> bool {
    record.get("deleted").and_then(Value::as_bool).unwrap_or(false)
}

/// Non-reserved query parameters filter on equal field values.
fn matches_filters(record: &Record, params: &HashMap<String, String>) -> bool {
    params
        .iter()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
        .all(|(key, expected)| match record.get(key) {
            Some(Value::String(value)) => value == expected,
            Some(value) => value.to_string() == *expected,
            None => false,
        })
}

fn parse_bounded(raw: &str, name: &str, min: usize, max: usize) -> Result<usize, Failure> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| Failure::bad_request(format!("{name} must be between {min} and {max}")))
}

/// Absolute URL of the page starting at `cursor`, keeping the caller's
/// other query parameters as sent.
fn next_link(headers: &HeaderMap, uri: &Uri, raw_query: Option<&str>, cursor: usize) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let mut query: Vec<&str> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("cursor="))
        .collect();
    let cursor = format!("cursor={cursor}");
    query.push(&cursor);
    format!("http://{host}{}?{}", uri.path(), query.join("&"))
}

fn envelope(singular: &str, record: Record) -> Value {
    let mut item = Map::new();
    item.insert("sub_request_status".to_string(), json!("SUCCESS"));
    item.insert(singular.to_string(), Value::Object(record));
    Value::Object(item)
}

fn sub_request_error(singular: &str, record: Record, reason: String) -> Value {
    let mut item = Map::new();
    item.insert("sub_request_status".to_string(), json!("ERROR"));
    item.insert("sub_request_error_reason".to_string(), Value::String(reason));
    item.insert(singular.to_string(), Value::Object(record));
    Value::Object(item)
}

fn collection_body(collection: &str, items: Vec<Value>, next_link: Option<String>) -> Value {
    let failed = items
        .iter()
        .any(|i| i.get("sub_request_status").and_then(Value::as_str) != Some("SUCCESS"));
    let mut body = Map::new();
    body.insert(
        "request_status".to_string(),
        json!(if failed { "PARTIAL" } else { "SUCCESS" }),
    );
    body.insert("request_id".to_string(), json!(Uuid::new_v4().to_string()));
    let paging = match next_link {
        Some(link) => json!({ "next_link": link }),
        None => json!({}),
    };
    body.insert("paging".to_string(), paging);
    body.insert(collection.to_string(), Value::Array(items));
    Value::Object(body)
}

fn object(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
