//! Typed client for the hierarchical Snapchat Marketing (ads) API.
//!
//! # Overview
//! Organizations own ad accounts, ad accounts own campaigns, campaigns own
//! ad squads and ad squads own ads. Every level is reachable through
//! [`AdsApi`], which authenticates with a bearer token, follows cursor
//! pagination and validates records against each entity's declared fields
//! before anything is sent.
//!
//! # Design
//! - `AdsClient` is stateless and sans-IO: it builds `HttpRequest` values and
//!   parses `HttpResponse` values. Each primitive is split into `build_*` and
//!   `parse_*`, so the I/O boundary is explicit.
//! - A [`Transport`] executes requests. [`UreqTransport`] is the blocking
//!   default; tests script their own.
//! - [`Session`] stamps the bearer token onto every request, including the
//!   follow-up GETs of pagination.
//! - Entities keep structured fields the client never interprets
//!   (`targeting`, `regulations`, ...) as raw JSON.
//!
//! ```no_run
//! use snapads_core::{AdsApi, ListOptions};
//!
//! let api = AdsApi::with_token("access-token");
//! for squad in api.list_ad_squads("campaign-id", &ListOptions::new().limit(50))? {
//!     println!("{} {:?}", squad.id, squad.status);
//! }
//! # Ok::<(), snapads_core::ApiError>(())
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod http;
pub mod pagination;
pub mod resource;
pub mod schema;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::{refresh_access_token, RefreshCredentials};
pub use client::AdsClient;
pub use config::AdsConfig;
pub use entity::{Ad, AdAccount, AdSquad, Bitmoji, Campaign, Entity, Organization, User};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{Collection, ListOptions, QueryValue, ResourceAddress};
pub use schema::{Fields, ValidationError};
pub use session::{AdsApi, Session};
pub use transport::{Transport, UreqTransport};
