//! Derived product name composition.
//!
//! # Responsibility
//! - Turn (commodity, company ordering, attribute values) into the display
//!   name persisted on a product.
//!
//! # Invariants
//! - Pure and deterministic: identical inputs yield identical names.
//! - The commodity name is always the last token.
//! - With a non-empty ordering, values whose attribute is not ranked are
//!   dropped from the name.
//! - With an empty ordering, every value is used, ascending by attribute id.

use crate::model::commodity::Commodity;
use crate::model::product::ProductAttributeValue;
use crate::model::RecordId;
use std::collections::BTreeMap;

/// Attribute values keyed by commodity attribute id.
pub type ValuesByAttribute = BTreeMap<RecordId, String>;

/// Builds the display name for one product.
///
/// `ordered_attribute_ids` is the company ordering as returned by
/// `OrderingResolver::resolve`.
pub fn compose_name(
    commodity: &Commodity,
    ordered_attribute_ids: &[RecordId],
    values: &ValuesByAttribute,
) -> String {
    let mut tokens: Vec<&str> = if ordered_attribute_ids.is_empty() {
        values.values().map(String::as_str).collect()
    } else {
        ordered_attribute_ids
            .iter()
            .filter_map(|attribute_id| values.get(attribute_id).map(String::as_str))
            .collect()
    };

    tokens.push(commodity.name.as_str());
    tokens.join(" ")
}

/// Indexes stored rows by attribute id.
///
/// Storage allows one row per (product, attribute); if a caller passes
/// several, the last one wins.
pub fn values_by_attribute<'a, I>(values: I) -> ValuesByAttribute
where
    I: IntoIterator<Item = &'a ProductAttributeValue>,
{
    values
        .into_iter()
        .map(|value| (value.commodity_attribute_id, value.value.clone()))
        .collect()
}
