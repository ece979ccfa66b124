//! # Lapak Purchase API
//!
//! HTTP surface of the purchase service.
//!
//! ## Module Organization
//! ```text
//! lapak_purchase_api/
//! ├── lib.rs            ◄─── AppState
//! ├── main.rs           ◄─── startup, logging, graceful shutdown
//! ├── config.rs         ◄─── environment configuration
//! ├── auth.rs           ◄─── trust headers → AuthContext
//! ├── routes.rs         ◄─── axum router and handlers
//! ├── assembler.rs      ◄─── snapshots → wire responses
//! ├── error.rs          ◄─── ApiError (code + status)
//! └── services/
//!     ├── errors.rs          ◄─── PurchaseError
//!     └── purchase_service.rs ◄─── the orchestrator
//! ```
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Gateway ──► routes ──► AuthContext ──► PurchaseService                 │
//! │                                            │        │                   │
//! │                                  lapak-upstream   lapak-db              │
//! │                                  (catalog,        (SQLite)              │
//! │                                   identity)                             │
//! │                                            │                            │
//! │                                        assembler ──► JSON response      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod assembler;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use lapak_db::Database;

use crate::auth::TrustVerifier;
use crate::services::PurchaseService;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub purchases: PurchaseService,
    pub trust: Arc<dyn TrustVerifier>,
}
