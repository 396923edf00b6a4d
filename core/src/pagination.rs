//! Cursor-following pagination.
//!
//! # Design
//! `Paginator` is a sans-IO state machine. It absorbs the first page on
//! construction, then exposes the next cursor URL for the caller to fetch and
//! absorbs each response fed back through [`Paginator::receive`]. The loop
//! that actually performs requests lives in `AdsApi::paginate`.
//!
//! A page contributes `page[data_key]` to the result. A page without the
//! data key ends pagination cleanly; a page without `paging.next_link` is the
//! last one. A failed follow-up fetch is fatal and is reported as
//! [`ApiError::Pagination`], never as a partial result.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Page ceiling applied when the caller does not choose one.
pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    Accumulating,
    Done,
    Failed,
}

/// Accumulates one list field across a chain of pages.
#[derive(Debug)]
pub struct Paginator {
    data_key: String,
    items: Vec<Value>,
    next_link: Option<String>,
    visited: HashSet<String>,
    pages: usize,
    max_pages: Option<usize>,
    state: PaginatorState,
}

impl Paginator {
    /// Start from an already fetched first page.
    ///
    /// `max_pages` bounds the total number of pages read, first page
    /// included; `None` or `Some(0)` removes the bound.
    pub fn new(
        first_page: Value,
        data_key: impl Into<String>,
        max_pages: Option<usize>,
    ) -> Result<Self, ApiError> {
        let mut paginator = Self {
            data_key: data_key.into(),
            items: Vec::new(),
            next_link: None,
            visited: HashSet::new(),
            pages: 0,
            max_pages: max_pages.filter(|&n| n > 0),
            state: PaginatorState::Accumulating,
        };
        paginator.absorb(first_page)?;
        Ok(paginator)
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Cursor to fetch next, or `None` once pagination has stopped.
    pub fn next_link(&self) -> Option<&str> {
        match self.state {
            PaginatorState::Accumulating => self.next_link.as_deref(),
            _ => None,
        }
    }

    /// Number of pages absorbed so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Feed the outcome of fetching [`next_link`](Self::next_link).
    pub fn receive(&mut self, response: Result<HttpResponse, ApiError>) -> Result<(), ApiError> {
        if self.state != PaginatorState::Accumulating || self.next_link.is_none() {
            return Err(ApiError::InvalidRequest(
                "paginator is not waiting for a page".to_string(),
            ));
        }

        let decoded = match response {
            Ok(response) => decode_page(response),
            Err(e) => Err((e.status(), e)),
        };
        let page = match decoded {
            Ok(page) => page,
            Err((status, source)) => {
                self.state = PaginatorState::Failed;
                tracing::warn!(
                    page = self.pages + 1,
                    status = ?status,
                    error = %source,
                    "failed to fetch next page"
                );
                return Err(ApiError::Pagination {
                    status,
                    source: Box::new(source),
                });
            }
        };

        self.absorb(page)
    }

    /// Accumulated items in server order.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    fn absorb(&mut self, page: Value) -> Result<(), ApiError> {
        self.pages += 1;

        let Some(data) = page.get(&self.data_key) else {
            debug!(page = self.pages, key = %self.data_key, "page has no data, stopping");
            return self.finish();
        };
        let Some(data) = data.as_array() else {
            self.state = PaginatorState::Failed;
            return Err(ApiError::MalformedResponse(format!(
                "`{}` is not an array on page {}",
                self.data_key, self.pages
            )));
        };
        self.items.extend(data.iter().cloned());
        debug!(page = self.pages, items = data.len(), total = self.items.len(), "absorbed page");

        let next = page
            .get("paging")
            .and_then(|p| p.get("next_link"))
            .and_then(Value::as_str);
        let Some(next) = next else {
            return self.finish();
        };

        if let Some(max_pages) = self.max_pages {
            if self.pages >= max_pages {
                self.state = PaginatorState::Failed;
                return Err(ApiError::PageLimitExceeded { max_pages });
            }
        }
        if !self.visited.insert(next.to_string()) {
            self.state = PaginatorState::Failed;
            return Err(ApiError::PaginationCycle {
                next_link: next.to_string(),
            });
        }

        self.next_link = Some(next.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ApiError> {
        self.next_link = None;
        self.state = PaginatorState::Done;
        Ok(())
    }
}

/// Turn a follow-up response into a page, keeping the status for errors.
fn decode_page(response: HttpResponse) -> Result<Value, (Option<u16>, ApiError)> {
    if response.status == 404 {
        return Err((Some(404), ApiError::NotFound));
    }
    if !response.is_success() {
        return Err((
            Some(response.status),
            ApiError::Http {
                status: response.status,
                body: response.body,
            },
        ));
    }
    serde_json::from_str(&response.body)
        .map_err(|e| (Some(response.status), ApiError::Deserialization(e.to_string())))
}
