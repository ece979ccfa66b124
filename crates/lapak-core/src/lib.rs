//! # lapak-core: Pure Business Logic for the Purchase Service
//!
//! This crate holds everything about a purchase that can be decided without
//! touching a socket or a disk: the record types, integer money, request
//! validation and the per-seller payment breakdown.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Purchase Service Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/purchase-api (Axum)                        │   │
//! │  │    trust edge ──► orchestrator ──► response assembler           │   │
//! │  └──────────┬──────────────────────────────────┬───────────────────┘   │
//! │             │                                  │                        │
//! │  ┌──────────▼──────────┐            ┌──────────▼──────────┐            │
//! │  │   lapak-upstream    │            │      lapak-db       │            │
//! │  │ catalog / identity  │            │  purchase records   │            │
//! │  └──────────┬──────────┘            └──────────┬──────────┘            │
//! │             │                                  │                        │
//! │  ┌──────────▼──────────────────────────────────▼───────────────────┐   │
//! │  │               ★ lapak-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │  money   │ │ pricing  │ │validation│          │   │
//! │  │   │ Purchase │ │  Money   │ │ totals   │ │ requests │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Purchase record types and upstream snapshots
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Order totals and per-seller payment breakdown
//! - [`dto`] - JSON request/response shapes of the public API
//! - [`validation`] - Request validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use lapak_core::money::Money;
//!
//! let unit = Money::from_cents(1000); // 10.00
//! let line = unit.checked_mul_quantity(2).unwrap();
//! assert_eq!(line.cents(), 2000);
//! assert_eq!(line.to_major_units(), 20.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dto;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::Money;
pub use types::*;
pub use validation::{PurchaseValidator, ValidationRules};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when the caller asks for none (or for a non-positive one).
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a caller may request; bigger requests are clamped down.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Default bounds for the sender name, in characters.
pub const SENDER_NAME_MIN_LEN: usize = 4;
pub const SENDER_NAME_MAX_LEN: usize = 55;

/// Largest quantity a single line item may order.
pub const MAX_QTY: i64 = 1_000_000;

/// Bounds for a phone contact detail, in characters.
pub const PHONE_MIN_LEN: usize = 10;
pub const PHONE_MAX_LEN: usize = 15;
