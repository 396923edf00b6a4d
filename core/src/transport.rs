//! Blocking execution of `HttpRequest` values.
//!
//! # Design
//! `Transport` is the seam between the sans-IO core and the network. The
//! shipped implementation wraps `ureq` agents configured with
//! `http_status_as_error(false)`, so 4xx/5xx responses come back as data and
//! the core decides what they mean. Only failures that never produced a
//! response are errors here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `ureq`-backed transport with optional per-scheme proxies.
///
/// Cloning is cheap and shares the underlying connection pools.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    direct: ureq::Agent,
    proxied: HashMap<String, ureq::Agent>,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            direct: agent(DEFAULT_TIMEOUT, None),
            proxied: HashMap::new(),
        }
    }
}

impl UreqTransport {
    pub fn builder() -> UreqTransportBuilder {
        UreqTransportBuilder::default()
    }

    fn agent_for(&self, url: &str) -> &ureq::Agent {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase());
        scheme
            .and_then(|s| self.proxied.get(&s))
            .unwrap_or(&self.direct)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent_for(&request.path);
        debug!(method = request.method.as_str(), url = %request.url(), "sending HTTP request");

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => prepare(agent.get(&request.path), request).call(),
            (HttpMethod::Delete, _) => prepare(agent.delete(&request.path), request).call(),
            (HttpMethod::Post, Some(body)) => prepare(agent.post(&request.path), request).send(body),
            (HttpMethod::Post, None) => prepare(agent.post(&request.path), request).send_empty(),
            (HttpMethod::Put, Some(body)) => prepare(agent.put(&request.path), request).send(body),
            (HttpMethod::Put, None) => prepare(agent.put(&request.path), request).send_empty(),
        };

        let mut response = result.map_err(|e| {
            debug!(method = request.method.as_str(), url = %request.path, error = %e, "HTTP request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(method = request.method.as_str(), url = %request.path, status, "received HTTP response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn prepare<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !request.query.is_empty() {
        builder = builder.query_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    if let Some(timeout) = request.timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

fn agent(timeout: Duration, proxy: Option<ureq::Proxy>) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .proxy(proxy)
        .build()
        .new_agent()
}

/// Builder for [`UreqTransport`].
#[derive(Debug)]
pub struct UreqTransportBuilder {
    timeout: Duration,
    proxies: Vec<(String, String)>,
}

impl Default for UreqTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            proxies: Vec::new(),
        }
    }
}

impl UreqTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route requests whose URL scheme is `scheme` through `proxy`.
    pub fn proxy(mut self, scheme: impl Into<String>, proxy: impl Into<String>) -> Self {
        self.proxies.push((scheme.into().to_ascii_lowercase(), proxy.into()));
        self
    }

    /// Add every `scheme -> proxy` entry of a mapping.
    pub fn proxies<I, K, V>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (scheme, proxy) in proxies {
            self = self.proxy(scheme, proxy);
        }
        self
    }

    pub fn build(self) -> Result<UreqTransport, ApiError> {
        let mut proxied = HashMap::new();
        for (scheme, address) in self.proxies {
            let proxy = ureq::Proxy::new(&address)
                .map_err(|e| ApiError::Proxy(format!("{scheme} -> {address}: {e}")))?;
            proxied.insert(scheme, agent(self.timeout, Some(proxy)));
        }
        Ok(UreqTransport {
            direct: agent(self.timeout, None),
            proxied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_proxies() {
        let transport = UreqTransport::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert!(transport.proxied.is_empty());
    }

    #[test]
    fn proxies_are_keyed_by_lowercase_scheme() {
        let transport = UreqTransport::builder()
            .proxies([("HTTPS", "http://127.0.0.1:8080")])
            .build()
            .unwrap();
        assert!(transport.proxied.contains_key("https"));
        assert!(std::ptr::eq(
            transport.agent_for("http://example.com/"),
            &transport.direct
        ));
        assert!(!std::ptr::eq(
            transport.agent_for("https://example.com/"),
            &transport.direct
        ));
    }

    #[test]
    fn invalid_proxy_is_rejected() {
        let err = UreqTransport::builder()
            .proxy("https", "ftp://127.0.0.1:21")
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Proxy(_)));
    }
}
