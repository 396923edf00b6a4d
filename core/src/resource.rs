//! Resource addressing and per-call list options.

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

/// Collections exposed by the ads API, in hierarchy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Organizations,
    AdAccounts,
    Campaigns,
    AdSquads,
    Ads,
}

impl Collection {
    /// Route segment, which is also the key of list payloads.
    pub fn plural(self) -> &'static str {
        match self {
            Collection::Organizations => "organizations",
            Collection::AdAccounts => "adaccounts",
            Collection::Campaigns => "campaigns",
            Collection::AdSquads => "adsquads",
            Collection::Ads => "ads",
        }
    }

    /// Key of the per-item envelope in list and bulk responses.
    pub fn singular(self) -> &'static str {
        match self {
            Collection::Organizations => "organization",
            Collection::AdAccounts => "adaccount",
            Collection::Campaigns => "campaign",
            Collection::AdSquads => "adsquad",
            Collection::Ads => "ad",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// A nested collection endpoint: `/{parent}/{parent_id}/{child}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAddress {
    parent: String,
    parent_id: String,
    child: String,
}

impl ResourceAddress {
    /// Build an address from raw route segments.
    ///
    /// Collection names must be non-empty lower-case segments and the parent
    /// id must be non-empty.
    pub fn new(
        parent: impl Into<String>,
        parent_id: impl Into<String>,
        child: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let parent = parent.into();
        let parent_id = parent_id.into();
        let child = child.into();

        for name in [&parent, &child] {
            if !is_collection_segment(name) {
                return Err(ApiError::InvalidRequest(format!(
                    "invalid collection name `{name}`"
                )));
            }
        }
        if parent_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest(format!(
                "empty parent id for {parent}/{child}"
            )));
        }

        Ok(Self {
            parent,
            parent_id,
            child,
        })
    }

    pub fn nested(parent: Collection, parent_id: &str, child: Collection) -> Result<Self, ApiError> {
        Self::new(parent.plural(), parent_id, child.plural())
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn child(&self) -> &str {
        &self.child
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.parent, self.parent_id, self.child)
    }
}

fn is_collection_segment(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A primitive query-string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Int(i) => write!(f, "{i}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl From<i64> for QueryValue {
    fn from(i: i64) -> Self {
        QueryValue::Int(i)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

/// Options recognized by list calls.
///
/// `limit` caps the page size and switches the call into pagination mode.
/// The filters are forwarded to the server untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub read_deleted_entities: Option<bool>,
    pub return_placement_v2: Option<bool>,
    /// Further filters, sent after the named ones in insertion order.
    pub filters: Vec<(String, QueryValue)>,
    /// Overrides the session's page ceiling for this call. `Some(0)` lifts
    /// the ceiling, matching `max_pages = 0` in the config file.
    pub max_pages: Option<usize>,
    pub timeout: Option<Duration>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn read_deleted_entities(mut self, read: bool) -> Self {
        self.read_deleted_entities = Some(read);
        self
    }

    pub fn return_placement_v2(mut self, placement: bool) -> Self {
        self.return_placement_v2 = Some(placement);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Query pairs in wire order: `limit` first, then the filters.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(read) = self.read_deleted_entities {
            pairs.push(("read_deleted_entities".to_string(), read.to_string()));
        }
        if let Some(placement) = self.return_placement_v2 {
            pairs.push(("return_placement_v2".to_string(), placement.to_string()));
        }
        pairs.extend(
            self.filters
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string())),
        );
        pairs
    }
}
