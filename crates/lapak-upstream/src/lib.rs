//! # lapak-upstream: Catalog & Identity Service Clients
//!
//! Outbound calls of the purchase service.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        lapak-upstream                                   │
//! │                                                                         │
//! │   PurchaseService                                                      │
//! │     │  Arc<dyn ProductCatalog>         Arc<dyn SellerDirectory>        │
//! │     ▼                                   ▼                               │
//! │   CatalogClient                       IdentityClient                   │
//! │     │                                   │                               │
//! │     └──────────► fanout::fetch_all ◄────┘   JoinSet, fail fast         │
//! │                        │                                                │
//! │                  ServiceClient  ── InternalCredentials (headers + JWT) │
//! │                        │                                                │
//! │                     reqwest                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`catalog`] - Product lookups and stock decrements
//! - [`identity`] - Seller payout details
//! - [`fanout`] - Concurrent, fail-fast batch lookups
//! - [`credentials`] - Trust headers and propagation tokens
//! - [`config`] - Service URLs, timeout, token lifetime
//! - [`error`] - Upstream error types

pub mod catalog;
mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fanout;
pub mod identity;

pub use catalog::{CatalogClient, ProductCatalog};
pub use config::UpstreamConfig;
pub use credentials::{InternalCredentials, PropagationClaims};
pub use error::{UpstreamError, UpstreamResult};
pub use identity::{IdentityClient, SellerDirectory};
