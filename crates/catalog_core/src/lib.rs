//! Attribute-driven product catalog core.
//! This crate is the single source of truth for catalog invariants: products
//! are composed from a commodity and typed attribute values, and their
//! display names are derived from a per-company attribute ordering.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::commodity::{Commodity, CommodityAttribute, CompanyAttributeSetting};
pub use model::product::{Product, ProductAttributeValue};
pub use model::validation::ValidationError;
pub use model::{CompanyId, RecordId};
pub use repo::attribute_value_repo::{
    AttributeValueFilter, AttributeValuePage, AttributeValueStore, SqliteAttributeValueRepository,
};
pub use repo::commodity_repo::{CommodityRepository, SqliteCommodityRepository};
pub use repo::ordering_repo::{OrderingResolver, SqliteOrderingRepository};
pub use repo::product_repo::{ProductFindOptions, ProductRepository, SqliteProductRepository};
pub use repo::{RepoError, RepoResult};
pub use service::name_composer::{compose_name, values_by_attribute, ValuesByAttribute};
pub use service::product_store::ProductStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
