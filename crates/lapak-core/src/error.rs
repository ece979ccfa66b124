//! # Error Types
//!
//! Domain-specific error types for lapak-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lapak-core errors (this file)                                         │
//! │  ├── CoreError         - General domain errors                         │
//! │  ├── ValidationError   - One failing field                             │
//! │  └── ValidationErrors  - Every failing field of one request            │
//! │                                                                         │
//! │  lapak-db errors        └── DbError        - Storage failures          │
//! │  lapak-upstream errors  └── UpstreamError  - Catalog/identity failures │
//! │  purchase-api           ├── PurchaseError  - Orchestrator outcomes     │
//! │                         └── ApiError       - What the caller sees      │
//! │                                                                         │
//! │  Flow: ValidationError → PurchaseError → ApiError → HTTP response      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An item references a seller for which no bank snapshot was captured.
    ///
    /// ## When This Occurs
    /// Only for a corrupted record: create always stores one seller
    /// snapshot per distinct seller of its items.
    #[error("No seller snapshot for seller {seller_id}")]
    SellerSnapshotMissing { seller_id: String },

    /// A line total or order total does not fit in i64 cents.
    #[error("Amount overflow while pricing {context}")]
    AmountOverflow { context: String },

    /// A rule set that can never be satisfied (e.g. min > max).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Validation error (wraps the collected field errors).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Field names are the camelCase names of the wire request, with an index
/// for list entries (`purchasedItems[1].qty`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// List has fewer entries than required.
    #[error("{field} must contain at least {min} entries")]
    TooFewEntries { field: String, min: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is above the allowed maximum.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// The wire field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::TooFewEntries { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

/// Every field error found in one request.
///
/// Validation keeps going after the first failure so the caller can fix
/// the whole request in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Records the error of `result`, if any, and returns its value.
    pub fn collect<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.0.push(error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Field name → message, first error per field wins.
    pub fn by_field(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        for error in &self.0 {
            fields
                .entry(error.field().to_string())
                .or_insert_with(|| error.to_string());
        }
        fields
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SellerSnapshotMissing {
            seller_id: "seller-1".to_string(),
        };
        assert_eq!(err.to_string(), "No seller snapshot for seller seller-1");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "senderName".to_string(),
        };
        assert_eq!(err.to_string(), "senderName is required");

        let err = ValidationError::TooShort {
            field: "senderName".to_string(),
            min: 4,
        };
        assert_eq!(err.to_string(), "senderName must be at least 4 characters");
    }

    #[test]
    fn test_collects_all_errors_and_keeps_first_per_field() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.collect::<()>(Ok(())), Some(()));
        errors.push(ValidationError::Required {
            field: "senderName".into(),
        });
        errors.push(ValidationError::TooShort {
            field: "senderName".into(),
            min: 4,
        });
        errors.push(ValidationError::MustBePositive {
            field: "purchasedItems[0].qty".into(),
        });

        assert_eq!(errors.len(), 3);
        let fields = errors.by_field();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["senderName"], "senderName is required");
        assert_eq!(
            fields["purchasedItems[0].qty"],
            "purchasedItems[0].qty must be positive"
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));

        let errors: ValidationErrors = ValidationError::Required {
            field: "fileIds".into(),
        }
        .into();
        assert!(errors.clone().into_result(()).is_err());
        assert_eq!(errors.to_string(), "fileIds is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let errors: ValidationErrors = ValidationError::Required {
            field: "fileIds".to_string(),
        }
        .into();
        let core_err: CoreError = errors.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
