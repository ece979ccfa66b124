//! Errors of the purchase orchestrator.
//!
//! Each variant names the stage that failed. Downstream and storage
//! variants keep the underlying error as their source so the cause is
//! logged, while [`crate::error::ApiError`] decides what reaches the caller.

use thiserror::Error;

use lapak_core::{CoreError, ValidationErrors};
use lapak_db::DbError;
use lapak_upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum PurchaseError {
    /// The request failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// No caller identity was propagated with the request.
    #[error("Caller identity missing")]
    Unauthenticated,

    /// The purchase exists but belongs to someone else.
    #[error("Purchase {purchase_id} is not owned by the caller")]
    Forbidden { purchase_id: String },

    /// The purchase id is not a UUID.
    #[error("Invalid purchase id: {0}")]
    InvalidPurchaseId(String),

    #[error("Purchase not found: {0}")]
    PurchaseNotFound(String),

    /// The catalog does not know one of the requested products.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The identity service could not provide every seller's bank details.
    #[error("Seller lookup failed: {source}")]
    SellerLookupFailed {
        #[source]
        source: UpstreamError,
    },

    #[error("Downstream call failed at {step}: {source}")]
    DownstreamUnavailable {
        step: &'static str,
        #[source]
        source: UpstreamError,
    },

    #[error("Persistence failed at {step}: {source}")]
    Persistence {
        step: &'static str,
        #[source]
        source: DbError,
    },

    /// Totals could not be computed from the stored snapshots.
    #[error("Pricing failed: {0}")]
    Pricing(#[from] CoreError),
}

impl PurchaseError {
    pub(crate) fn persistence(step: &'static str) -> impl FnOnce(DbError) -> Self {
        move |source| PurchaseError::Persistence { step, source }
    }

    pub(crate) fn downstream(step: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| PurchaseError::DownstreamUnavailable { step, source }
    }
}

pub type PurchaseResult<T> = Result<T, PurchaseError>;
