//! Authenticated session and the `AdsApi` facade.
//!
//! # Design
//! `Session` owns the bearer token and the transport and stamps the
//! `Authorization` header onto every request it executes, including the
//! follow-up GETs issued while paginating. `AdsApi` composes the stateless
//! `AdsClient` with a session: each primitive is `build_*`, execute,
//! `parse_*`. Replacing the token needs `&mut Session`, so it cannot race
//! requests issued through the same session.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::client::{AdsClient, ListPage};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::{Paginator, DEFAULT_MAX_PAGES};
use crate::resource::{ListOptions, ResourceAddress};
use crate::transport::{Transport, UreqTransport};

/// Bearer token plus the transport it authenticates.
pub struct Session<T> {
    access_token: String,
    transport: T,
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl<T: Clone> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            access_token: self.access_token.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl<T: Transport> Session<T> {
    pub fn new(access_token: impl Into<String>, transport: T) -> Self {
        Self {
            access_token: access_token.into(),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    /// Execute `request` with the bearer token applied.
    pub fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        request.set_header("authorization", format!("Bearer {}", self.access_token));
        self.transport.send(&request)
    }
}

/// Typed entry point to the ads API.
#[derive(Debug, Clone)]
pub struct AdsApi<T = UreqTransport> {
    client: AdsClient,
    session: Session<T>,
    max_pages: Option<usize>,
    timeout: Option<Duration>,
}

impl AdsApi<UreqTransport> {
    /// Client against the default API root with a default transport.
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self::new(AdsClient::default(), Session::new(access_token, UreqTransport::default()))
    }
}

impl<T: Transport> AdsApi<T> {
    pub fn new(client: AdsClient, session: Session<T>) -> Self {
        Self {
            client,
            session,
            max_pages: Some(DEFAULT_MAX_PAGES),
            timeout: None,
        }
    }

    /// Page ceiling for list calls that do not set their own; `None` or
    /// `Some(0)` removes it.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn client(&self) -> &AdsClient {
        &self.client
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.session.set_access_token(access_token);
    }

    /// Copy of this API whose requests use `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self
    where
        T: Clone,
    {
        let mut api = self.clone();
        api.timeout = Some(timeout);
        api
    }

    pub(crate) fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = match (request.timeout, self.timeout) {
            (None, Some(timeout)) => request.with_timeout(Some(timeout)),
            _ => request,
        };
        let method = request.method;
        let url = request.path.clone();
        let response = self.session.execute(request)?;
        debug!(method = method.as_str(), %url, status = response.status, "ads API call");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Generic primitives
    // -----------------------------------------------------------------------

    /// List the children of `address`.
    ///
    /// Without `options.limit` a single GET is made and its payload is the
    /// result. With a limit the first page seeds [`paginate`](Self::paginate).
    pub fn list_entities(
        &self,
        address: &ResourceAddress,
        options: &ListOptions,
    ) -> Result<Vec<Value>, ApiError> {
        let request = self.client.build_list_entities(address, options);
        let response = self.execute(request)?;
        match self.client.parse_list_entities(address, options, response)? {
            ListPage::Single(items) => Ok(items),
            ListPage::Paged(first_page) => self.paginate_with(
                first_page,
                address.child(),
                options.max_pages.or(self.max_pages),
                options.timeout,
            ),
        }
    }

    /// Follow `paging.next_link` from `first_page` until the chain ends,
    /// collecting `first_page[data_key]` and the same key of every later page.
    pub fn paginate(&self, first_page: Value, data_key: &str) -> Result<Vec<Value>, ApiError> {
        self.paginate_with(first_page, data_key, self.max_pages, None)
    }

    fn paginate_with(
        &self,
        first_page: Value,
        data_key: &str,
        max_pages: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut paginator = Paginator::new(first_page, data_key, max_pages)?;
        while let Some(next_link) = paginator.next_link() {
            let request = self.client.build_follow_link(next_link).with_timeout(timeout);
            let response = self.execute(request);
            paginator.receive(response)?;
        }
        debug!(key = data_key, pages = paginator.pages(), "pagination complete");
        Ok(paginator.into_items())
    }

    pub fn get_entity(&self, collection: &str, id: &str) -> Result<Value, ApiError> {
        let request = self.client.build_get_entity(collection, id)?;
        self.client.parse_get_entity(collection, self.execute(request)?)
    }

    /// Bulk-create `records` under one parent.
    pub fn create_entities(
        &self,
        address: &ResourceAddress,
        records: &[Value],
    ) -> Result<Vec<Value>, ApiError> {
        let request = self.client.build_create_entities(address, records)?;
        self.client.parse_create_entities(address, self.execute(request)?)
    }

    /// Bulk-update `records` under one parent; each record carries its `id`.
    pub fn update_entities(
        &self,
        address: &ResourceAddress,
        records: &[Value],
    ) -> Result<Vec<Value>, ApiError> {
        let request = self.client.build_update_entities(address, records)?;
        self.client.parse_update_entities(address, self.execute(request)?)
    }

    pub fn delete_entity(&self, collection: &str, id: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_entity(collection, id)?;
        self.client.parse_delete_entity(self.execute(request)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::Collection;
    use crate::testing::MockTransport;

    fn api(transport: MockTransport) -> AdsApi<MockTransport> {
        AdsApi::new(
            AdsClient::new("https://api.test/v1"),
            Session::new("tok", transport),
        )
    }

    fn squads_of(campaign: &str) -> ResourceAddress {
        ResourceAddress::nested(Collection::Campaigns, campaign, Collection::AdSquads).unwrap()
    }

    #[test]
    fn every_request_carries_bearer_token() {
        let transport = MockTransport::new().respond(200, json!({"me": {"id": "U1"}}));
        let api = api(transport);
        api.get_entity("campaigns", "C1").unwrap_err();
        let requests = api.session().transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn token_replacement_applies_to_later_requests() {
        let transport = MockTransport::new()
            .respond(200, json!({"campaigns": []}))
            .respond(200, json!({"campaigns": []}));
        let mut api = api(transport);
        api.get_entity("campaigns", "C1").unwrap();
        api.set_access_token("fresh");
        api.get_entity("campaigns", "C1").unwrap();
        let requests = api.session().transport().requests();
        assert_eq!(requests[1].header("authorization"), Some("Bearer fresh"));
    }

    #[test]
    fn paginate_single_page_makes_no_requests() {
        let api = api(MockTransport::new());
        let items = api
            .paginate(json!({"adsquads": [{"id": "a"}, {"id": "b"}], "paging": {}}), "adsquads")
            .unwrap();
        assert_eq!(items, vec![json!({"id": "a"}), json!({"id": "b"})]);
        assert_eq!(api.session().transport().call_count(), 0);
    }

    #[test]
    fn paginate_follows_three_pages() {
        let transport = MockTransport::new()
            .respond(
                200,
                json!({"adsquads": [{"id": 3}, {"id": 4}], "paging": {"next_link": "https://api.test/p3"}}),
            )
            .respond(200, json!({"adsquads": [{"id": 5}, {"id": 6}], "paging": {}}));
        let api = api(transport);
        let items = api
            .paginate(
                json!({"adsquads": [{"id": 1}, {"id": 2}], "paging": {"next_link": "https://api.test/p2"}}),
                "adsquads",
            )
            .unwrap();
        let ids: Vec<i64> = items.iter().map(|v| v["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

        let requests = api.session().transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "https://api.test/p2");
        assert_eq!(requests[1].path, "https://api.test/p3");
        assert!(requests
            .iter()
            .all(|r| r.header("authorization") == Some("Bearer tok")));
    }

    #[test]
    fn paginate_failure_carries_status() {
        let transport = MockTransport::new().respond_raw(500, "internal error");
        let api = api(transport);
        let err = api
            .paginate(
                json!({"adsquads": [{"id": 1}], "paging": {"next_link": "https://api.test/p2"}}),
                "adsquads",
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::Pagination { status: Some(500), .. }));
    }

    #[test]
    fn paginate_respects_session_ceiling() {
        let transport = MockTransport::new().respond(
            200,
            json!({"adsquads": [{"id": 2}], "paging": {"next_link": "https://api.test/p3"}}),
        );
        let api = api(transport).with_max_pages(Some(2));
        let err = api
            .paginate(
                json!({"adsquads": [{"id": 1}], "paging": {"next_link": "https://api.test/p2"}}),
                "adsquads",
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::PageLimitExceeded { max_pages: 2 }));
    }

    #[test]
    fn per_call_zero_ceiling_lifts_session_ceiling() {
        let transport = MockTransport::new()
            .respond(
                200,
                json!({"adsquads": [{"id": "S1"}], "paging": {"next_link": "https://api.test/page2"}}),
            )
            .respond(
                200,
                json!({"adsquads": [{"id": "S2"}], "paging": {"next_link": "https://api.test/page3"}}),
            )
            .respond(200, json!({"adsquads": [{"id": "S3"}], "paging": {}}));
        let api = api(transport).with_max_pages(Some(1));
        let items = api
            .list_entities(&squads_of("C1"), &ListOptions::new().limit(1).max_pages(0))
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(api.session().transport().call_count(), 3);
    }

    #[test]
    fn list_transport_failure_on_follow_up_has_no_status() {
        let transport = MockTransport::new()
            .respond(
                200,
                json!({"adsquads": [{"id": "S1"}], "paging": {"next_link": "https://api.test/page2"}}),
            )
            .fail(ApiError::Transport("connection reset".to_string()));
        let api = api(transport);
        let err = api
            .list_entities(&squads_of("C1"), &ListOptions::new().limit(1))
            .unwrap_err();
        match err {
            ApiError::Pagination { status: None, source } => {
                assert!(matches!(*source, ApiError::Transport(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.session().transport().call_count(), 2);
    }

    #[test]
    fn list_without_limit_is_single_request() {
        let transport = MockTransport::new().respond(
            200,
            json!({
                "adsquads": [{"id": "S1"}],
                "paging": {"next_link": "https://api.test/v1/campaigns/C1/adsquads?cursor=x"}
            }),
        );
        let api = api(transport);
        let items = api
            .list_entities(&squads_of("C1"), &ListOptions::default())
            .unwrap();
        assert_eq!(items, vec![json!({"id": "S1"})]);
        let requests = api.session().transport().requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].query.is_empty());
    }

    #[test]
    fn list_with_limit_paginates() {
        let transport = MockTransport::new()
            .respond(
                200,
                json!({"adsquads": [{"id": "S1"}], "paging": {"next_link": "https://api.test/page2"}}),
            )
            .respond(200, json!({"adsquads": [{"id": "S2"}], "paging": {}}));
        let api = api(transport);
        let items = api
            .list_entities(&squads_of("C1"), &ListOptions::new().limit(2))
            .unwrap();
        assert_eq!(items, vec![json!({"id": "S1"}), json!({"id": "S2"})]);

        let requests = api.session().transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query, vec![("limit".to_string(), "2".to_string())]);
        assert_eq!(requests[1].path, "https://api.test/page2");
        assert!(requests[1].query.is_empty());
    }

    #[test]
    fn list_filters_are_forwarded() {
        let transport = MockTransport::new().respond(200, json!({"campaigns": []}));
        let api = api(transport);
        let address =
            ResourceAddress::nested(Collection::AdAccounts, "A1", Collection::Campaigns).unwrap();
        api.list_entities(&address, &ListOptions::new().read_deleted_entities(true))
            .unwrap();
        let requests = api.session().transport().requests();
        assert_eq!(
            requests[0].query,
            vec![("read_deleted_entities".to_string(), "true".to_string())]
        );
    }

    #[test]
    fn list_http_error_is_not_pagination_error() {
        let transport = MockTransport::new().respond_raw(401, "unauthorized");
        let api = api(transport);
        let err = api
            .list_entities(&squads_of("C1"), &ListOptions::new().limit(5))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 401, .. }));
    }

    #[test]
    fn create_returns_server_records() {
        let transport = MockTransport::new().respond(
            200,
            json!({"adsquads": [{"id": "S9", "name": "x", "created_at": "2024-01-01T00:00:00Z"}]}),
        );
        let api = api(transport);
        let created = api
            .create_entities(&squads_of("C1"), &[json!({"name": "x"})])
            .unwrap();
        let first = created[0].as_object().unwrap();
        assert_eq!(first.get("name"), Some(&json!("x")));
        assert!(first.contains_key("id"));
    }

    #[test]
    fn update_without_id_makes_no_request() {
        let api = api(MockTransport::new());
        let err = api
            .update_entities(&squads_of("C1"), &[json!({"name": "x"})])
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(api.session().transport().call_count(), 0);
    }

    #[test]
    fn get_and_delete_raise_on_error() {
        let transport = MockTransport::new()
            .respond_raw(500, "oops")
            .respond_raw(404, "");
        let api = api(transport);
        assert!(matches!(
            api.get_entity("campaigns", "C1").unwrap_err(),
            ApiError::Http { status: 500, .. }
        ));
        assert!(matches!(
            api.delete_entity("campaigns", "C1").unwrap_err(),
            ApiError::NotFound
        ));
    }

    #[test]
    fn per_call_timeout_is_attached() {
        let transport = MockTransport::new().respond(200, json!({"campaigns": []}));
        let api = api(transport).with_timeout(Duration::from_secs(3));
        api.get_entity("campaigns", "C1").unwrap();
        let requests = api.session().transport().requests();
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(3)));
    }
}
