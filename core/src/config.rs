//! Layered client configuration.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. `snapads.toml` in the working directory (optional)
//! 3. Environment variables prefixed with `SNAPADS_`, e.g.
//!    `SNAPADS_ACCESS_TOKEN`, `SNAPADS_BASE_URL`, `SNAPADS_TIMEOUT_SECS`,
//!    `SNAPADS_MAX_PAGES`, `SNAPADS_PROXY_HTTP`, `SNAPADS_PROXY_HTTPS`
//!
//! ```toml
//! access_token = "..."
//! base_url = "https://adsapi.snapchat.com/v1/"
//! timeout_secs = 30
//! max_pages = 1000
//! proxy_https = "http://127.0.0.1:8080"
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::client::{AdsClient, DEFAULT_BASE_URL};
use crate::error::ApiError;
use crate::pagination::DEFAULT_MAX_PAGES;
use crate::session::{AdsApi, Session};
use crate::transport::{UreqTransport, DEFAULT_TIMEOUT};

const ENV_PREFIX: &str = "SNAPADS";
const LOCAL_FILE: &str = "snapads.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdsConfig {
    pub access_token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// `0` disables the page ceiling.
    pub max_pages: usize,
    pub proxy_http: Option<String>,
    pub proxy_https: Option<String>,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_pages: DEFAULT_MAX_PAGES,
            proxy_http: None,
            proxy_https: None,
        }
    }
}

impl AdsConfig {
    /// Load from `./snapads.toml` and the environment.
    pub fn load() -> Result<Self, ApiError> {
        Self::load_from(Path::new(LOCAL_FILE))
    }

    /// Load from the given file (skipped when absent) and the environment.
    pub fn load_from(path: &Path) -> Result<Self, ApiError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|e| ApiError::Config(e.to_string()))
    }

    /// Parse a TOML document on its own, without consulting the environment.
    pub fn from_toml(content: &str) -> Result<Self, ApiError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ApiError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn proxies(&self) -> Vec<(&'static str, String)> {
        [("http", &self.proxy_http), ("https", &self.proxy_https)]
            .into_iter()
            .filter_map(|(scheme, proxy)| proxy.clone().map(|p| (scheme, p)))
            .collect()
    }

    pub fn build_transport(&self) -> Result<UreqTransport, ApiError> {
        UreqTransport::builder()
            .timeout(self.timeout())
            .proxies(self.proxies())
            .build()
    }

    /// Ready-to-use client; fails without an access token.
    pub fn into_api(self) -> Result<AdsApi<UreqTransport>, ApiError> {
        let token = self
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::Config("access_token is not set".to_string()))?;
        let transport = self.build_transport()?;
        let max_pages = (self.max_pages > 0).then_some(self.max_pages);
        Ok(AdsApi::new(AdsClient::new(&self.base_url), Session::new(token, transport))
            .with_max_pages(max_pages))
    }
}
