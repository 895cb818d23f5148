//! Field-level validation errors for catalog records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-correctable input problem. Never retried by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required reference id is zero or negative.
    NonPositiveId { field: &'static str, value: i64 },
    /// A required text field is empty after trimming.
    BlankField(&'static str),
    /// The same attribute appears more than once in one input set.
    DuplicateAttribute(i64),
    /// The attribute's commodity type differs from the product's commodity.
    AttributeNotApplicable {
        attribute_id: i64,
        commodity_type: String,
    },
    /// A value row names a company other than its product's.
    CompanyMismatch {
        product_id: i64,
        expected: i64,
        actual: i64,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId { field, value } => {
                write!(f, "`{field}` must be a positive id, got {value}")
            }
            Self::BlankField(field) => write!(f, "`{field}` cannot be blank"),
            Self::DuplicateAttribute(id) => {
                write!(f, "commodity attribute {id} is given more than once")
            }
            Self::AttributeNotApplicable {
                attribute_id,
                commodity_type,
            } => write!(
                f,
                "commodity attribute {attribute_id} does not apply to commodity type `{commodity_type}`"
            ),
            Self::CompanyMismatch {
                product_id,
                expected,
                actual,
            } => write!(
                f,
                "product {product_id} belongs to company {expected}, not {actual}"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_positive(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveId { field, value })
    }
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::BlankField(field))
    } else {
        Ok(())
    }
}
