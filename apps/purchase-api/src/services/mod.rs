//! Purchase orchestration.
//!
//! This module contains the service layer behind the HTTP routes.

pub mod errors;
pub mod purchase_service;

pub use errors::{PurchaseError, PurchaseResult};
pub use purchase_service::{PurchaseService, ServiceOptions};
