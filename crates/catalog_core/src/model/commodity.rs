//! Commodity, attribute and per-company ordering records.
//!
//! # Responsibility
//! - Describe which attributes apply to which kind of goods.
//! - Carry the sparse per-company display ranking of attributes.
//!
//! # Invariants
//! - Commodity and attribute names are globally unique (enforced by storage).
//! - An attribute applies to a commodity when their commodity types match.
//! - Company settings need not cover every attribute of a type.

use super::validation::{require_positive, require_text, ValidationError};
use super::{CompanyId, RecordId};
use serde::{Deserialize, Serialize};

/// Category of goods, e.g. "Apple". Its `name` is the last token of every
/// derived product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    pub id: RecordId,
    pub name: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: bool,
}

impl Commodity {
    /// Creates an unsaved, visible commodity.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            kind: kind.into(),
            visible: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("commodity.name", &self.name)?;
        require_text("commodity.type", &self.kind)
    }
}

/// Named characteristic usable by commodities of one type, e.g. "Color".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityAttribute {
    pub id: RecordId,
    pub name: String,
    pub commodity_type: String,
}

impl CommodityAttribute {
    /// Creates an unsaved attribute definition.
    pub fn new(name: impl Into<String>, commodity_type: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            commodity_type: commodity_type.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("commodity_attribute.name", &self.name)?;
        require_text("commodity_attribute.commodity_type", &self.commodity_type)
    }

    /// Returns whether this attribute may be set on products of `commodity`.
    pub fn applies_to(&self, commodity: &Commodity) -> bool {
        self.commodity_type == commodity.kind
    }
}

/// One rank entry of a company's attribute display order.
///
/// Lower `display_order` sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAttributeSetting {
    pub id: RecordId,
    pub company_id: CompanyId,
    pub commodity_attribute_id: RecordId,
    pub display_order: i64,
}

impl CompanyAttributeSetting {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("company_attribute_setting.company_id", self.company_id)?;
        require_positive(
            "company_attribute_setting.commodity_attribute_id",
            self.commodity_attribute_id,
        )
    }
}
