//! # Validation Module
//!
//! Input validation for the purchase API.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: JSON decode (serde)                                          │
//! │  └── Shape only; missing fields fall back to empty defaults            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (PurchaseValidator)                              │
//! │  ├── Every field checked, every failure collected                      │
//! │  └── Produces a ValidatedOrder the orchestrator can trust              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (qty > 0), CHECK (contact_type IN ...)                      │
//! │  └── Foreign keys between purchase tables                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lapak_core::dto::{CreatePurchaseRequest, PurchaseItemRequest};
//! use lapak_core::validation::{PurchaseValidator, ValidationRules};
//!
//! let validator = PurchaseValidator::new(ValidationRules::default()).unwrap();
//! let request = CreatePurchaseRequest {
//!     purchased_items: vec![PurchaseItemRequest { product_id: "p-1".into(), qty: 2 }],
//!     sender_name: "Budi Santoso".into(),
//!     sender_contact_type: "email".into(),
//!     sender_contact_detail: "budi@example.com".into(),
//! };
//! let order = validator.validate_create(&request).unwrap();
//! assert_eq!(order.lines[0].qty, 2);
//! ```

use regex::Regex;

use crate::dto::{CreatePurchaseRequest, PaymentProofRequest};
use crate::error::{CoreError, CoreResult, ValidationError, ValidationErrors};
use crate::types::{ContactType, OrderLine, SenderDetails, ValidatedOrder};
use crate::{MAX_QTY, PHONE_MAX_LEN, PHONE_MIN_LEN, SENDER_NAME_MAX_LEN, SENDER_NAME_MIN_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an identifier that must be a UUID (purchase ids).
///
/// ## Example
/// ```rust
/// use lapak_core::validation::validate_uuid;
///
/// assert!(validate_uuid("0190c2a4-5d3e-7b8f-9a1b-2c3d4e5f6a7b", "purchaseId").is_ok());
/// assert!(validate_uuid("not-a-uuid", "purchaseId").is_err());
/// ```
pub fn validate_uuid(id: &str, field: &str) -> ValidationResult<uuid::Uuid> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })
}

/// Validates a non-empty opaque identifier, returning it trimmed.
pub fn validate_identifier(id: &str, field: &str) -> ValidationResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(id.to_string())
}

/// Validates a line quantity: at least one unit, at most [`MAX_QTY`].
pub fn validate_quantity(qty: i64, field: &str) -> ValidationResult<i64> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if qty > MAX_QTY {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_QTY,
        });
    }
    Ok(qty)
}

/// Validates a phone contact detail by length.
pub fn validate_phone(phone: &str, field: &str) -> ValidationResult<()> {
    let len = phone.chars().count();
    if len < PHONE_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: PHONE_MIN_LEN,
        });
    }
    if len > PHONE_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: PHONE_MAX_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Purchase Validator
// =============================================================================

/// Tunable bounds for request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub sender_name_min: usize,
    pub sender_name_max: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            sender_name_min: SENDER_NAME_MIN_LEN,
            sender_name_max: SENDER_NAME_MAX_LEN,
        }
    }
}

/// Request validator, built once from configuration and shared by handlers.
#[derive(Debug, Clone)]
pub struct PurchaseValidator {
    rules: ValidationRules,
    email: Regex,
}

impl PurchaseValidator {
    pub fn new(rules: ValidationRules) -> CoreResult<Self> {
        if rules.sender_name_min == 0 || rules.sender_name_min > rules.sender_name_max {
            return Err(CoreError::Configuration(format!(
                "sender name bounds {}..={} are empty",
                rules.sender_name_min, rules.sender_name_max
            )));
        }
        let email = Regex::new(EMAIL_PATTERN)
            .map_err(|e| CoreError::Configuration(format!("email pattern: {e}")))?;
        Ok(Self { rules, email })
    }

    pub fn rules(&self) -> ValidationRules {
        self.rules
    }

    /// Checks a create request, collecting every field error.
    pub fn validate_create(
        &self,
        request: &CreatePurchaseRequest,
    ) -> Result<ValidatedOrder, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if request.purchased_items.is_empty() {
            errors.push(ValidationError::TooFewEntries {
                field: "purchasedItems".to_string(),
                min: 1,
            });
        }

        let mut lines = Vec::with_capacity(request.purchased_items.len());
        for (index, item) in request.purchased_items.iter().enumerate() {
            let product_id = errors.collect(validate_identifier(
                &item.product_id,
                &format!("purchasedItems[{index}].productId"),
            ));
            let qty = errors.collect(validate_quantity(
                item.qty,
                &format!("purchasedItems[{index}].qty"),
            ));
            if let (Some(product_id), Some(qty)) = (product_id, qty) {
                lines.push(OrderLine { product_id, qty });
            }
        }

        let name = errors.collect(self.validate_sender_name(&request.sender_name));
        let contact = errors.collect(self.validate_contact(
            &request.sender_contact_type,
            &request.sender_contact_detail,
        ));

        match (name, contact) {
            (Some(name), Some((contact_type, contact_detail))) if errors.is_empty() => {
                Ok(ValidatedOrder {
                    lines,
                    sender: SenderDetails {
                        name,
                        contact_type,
                        contact_detail,
                    },
                })
            }
            _ => Err(errors),
        }
    }

    /// Checks a payment-proof upload, returning the trimmed file ids.
    pub fn validate_payment_proof(
        &self,
        request: &PaymentProofRequest,
    ) -> Result<Vec<String>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if request.file_ids.is_empty() {
            errors.push(ValidationError::TooFewEntries {
                field: "fileIds".to_string(),
                min: 1,
            });
        }

        let file_ids: Vec<String> = request
            .file_ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                errors.collect(validate_identifier(id, &format!("fileIds[{index}]")))
            })
            .collect();

        errors.into_result(file_ids)
    }

    fn validate_sender_name(&self, name: &str) -> ValidationResult<String> {
        let field = "senderName";
        let name = name.trim();

        if name.is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }

        let len = name.chars().count();
        if len < self.rules.sender_name_min {
            return Err(ValidationError::TooShort {
                field: field.to_string(),
                min: self.rules.sender_name_min,
            });
        }
        if len > self.rules.sender_name_max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: self.rules.sender_name_max,
            });
        }

        Ok(name.to_string())
    }

    fn validate_contact(
        &self,
        contact_type: &str,
        detail: &str,
    ) -> ValidationResult<(ContactType, String)> {
        let contact_type: ContactType =
            contact_type
                .trim()
                .parse()
                .map_err(|_| ValidationError::NotAllowed {
                    field: "senderContactType".to_string(),
                    allowed: ContactType::ALL.iter().map(|c| c.to_string()).collect(),
                })?;

        let field = "senderContactDetail";
        let detail = detail.trim();
        if detail.is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }

        match contact_type {
            ContactType::Email => {
                if !self.email.is_match(detail) {
                    return Err(ValidationError::InvalidFormat {
                        field: field.to_string(),
                        reason: "must be a valid email address".to_string(),
                    });
                }
            }
            ContactType::Phone => validate_phone(detail, field)?,
        }

        Ok((contact_type, detail.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
