//! Product and product-attribute-value records.
//!
//! # Responsibility
//! - Define the product shape exposed to the service layer.
//! - Validate caller-controlled fields before any persistence.
//!
//! # Invariants
//! - `Product::name` is derived by the core; caller input is ignored.
//! - A product belongs to exactly one company and one commodity.
//! - Binding fields of an attribute value (product, company, attribute) are
//!   immutable once stored; only `value` may change.

use super::validation::{require_positive, require_text, ValidationError};
use super::{CompanyId, RecordId};
use serde::{Deserialize, Serialize};

/// Sellable item of one company, composed from a commodity and attribute
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub commodity_id: RecordId,
    pub company_id: CompanyId,
    /// Derived display name. Overwritten on every write.
    pub name: String,
    /// Soft-delete flag; `false` after `ProductStore::delete`.
    pub visible: bool,
}

impl Product {
    /// Creates an unsaved, visible product with an empty derived name.
    pub fn new(commodity_id: RecordId, company_id: CompanyId) -> Self {
        Self {
            id: 0,
            commodity_id,
            company_id,
            name: String::new(),
            visible: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("product.commodity_id", self.commodity_id)?;
        require_positive("product.company_id", self.company_id)
    }

    /// Flips visibility off.
    pub fn soft_delete(&mut self) {
        self.visible = false;
    }
}

/// Concrete value of one attribute on one product, e.g. `Color = "Red"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributeValue {
    pub id: RecordId,
    pub product_id: RecordId,
    pub company_id: CompanyId,
    pub commodity_attribute_id: RecordId,
    pub value: String,
}

impl ProductAttributeValue {
    /// Creates an unbound value; `ProductStore` stamps product and company
    /// ids when persisting it.
    pub fn new(commodity_attribute_id: RecordId, value: impl Into<String>) -> Self {
        Self {
            id: 0,
            product_id: 0,
            company_id: 0,
            commodity_attribute_id,
            value: value.into(),
        }
    }

    /// Validates fields the caller controls before binding.
    pub fn validate_unbound(&self) -> Result<(), ValidationError> {
        require_positive(
            "product_attribute_value.commodity_attribute_id",
            self.commodity_attribute_id,
        )?;
        require_text("product_attribute_value.value", &self.value)
    }

    /// Validates a fully bound row before insert.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("product_attribute_value.product_id", self.product_id)?;
        require_positive("product_attribute_value.company_id", self.company_id)?;
        self.validate_unbound()
    }

    /// Returns a copy bound to `product`.
    pub fn bound_to(&self, product: &Product) -> Self {
        Self {
            id: 0,
            product_id: product.id,
            company_id: product.company_id,
            commodity_attribute_id: self.commodity_attribute_id,
            value: self.value.clone(),
        }
    }
}
