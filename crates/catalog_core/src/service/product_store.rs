//! Product use-case service.
//!
//! # Responsibility
//! - Create, update, soft-delete, get and find products.
//! - Keep each product's derived name in sync with its commodity, its
//!   attribute values and its company's attribute ordering.
//!
//! # Invariants
//! - `create`, `update` and `refresh_names` run in one IMMEDIATE transaction;
//!   any failure rolls back every change made by the call.
//! - The derived name is recomputed on every write, including updates that
//!   leave attribute rows untouched.
//! - A non-empty attribute list on update replaces the full set; an empty one
//!   keeps existing rows, which must still apply to the product's commodity.
//! - No operation physically removes a product or, on soft delete, its
//!   attribute rows.
//! - Concurrent updates of one product are last-writer-wins.

use crate::model::commodity::Commodity;
use crate::model::product::{Product, ProductAttributeValue};
use crate::model::validation::ValidationError;
use crate::model::{CompanyId, RecordId};
use crate::repo::attribute_value_repo::{
    AttributeValueFilter, AttributeValueStore, SqliteAttributeValueRepository,
};
use crate::repo::commodity_repo::{CommodityRepository, SqliteCommodityRepository};
use crate::repo::ordering_repo::{OrderingResolver, SqliteOrderingRepository};
use crate::repo::product_repo::{ProductFindOptions, ProductRepository, SqliteProductRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::name_composer::{compose_name, values_by_attribute};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeSet;
use std::time::Instant;

/// Orchestrates product writes over one borrowed connection.
///
/// Construct once per connection and pass it to callers; there is no shared
/// global instance.
pub struct ProductStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ProductStore<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a visible product together with its attribute values.
    ///
    /// `product.id`, `product.name` and `product.visible` are ignored. Value
    /// rows are stamped with the new product id and the product's company.
    /// Returns the stored product including its derived name.
    pub fn create(
        &mut self,
        product: &Product,
        attribute_values: &[ProductAttributeValue],
    ) -> RepoResult<Product> {
        let started_at = Instant::now();
        let result = self.create_in_tx(product, attribute_values);
        log_outcome(
            "product_create",
            started_at,
            &result,
            product.company_id,
            attribute_values.len(),
        );
        result
    }

    /// Updates commodity, company and visibility of an existing product.
    ///
    /// When `attribute_values` is non-empty, all existing value rows are
    /// replaced by it. The name is recomputed either way.
    pub fn update(
        &mut self,
        product: &Product,
        attribute_values: &[ProductAttributeValue],
    ) -> RepoResult<Product> {
        let started_at = Instant::now();
        let result = self.update_in_tx(product, attribute_values);
        log_outcome(
            "product_update",
            started_at,
            &result,
            product.company_id,
            attribute_values.len(),
        );
        result
    }

    /// Hides a product. Attribute rows are retained.
    pub fn delete(&self, id: RecordId) -> RepoResult<()> {
        let result = SqliteProductRepository::new(self.conn).soft_delete(id);
        match &result {
            Ok(()) => info!("event=product_delete module=product_store status=ok product_id={id}"),
            Err(err) => warn!(
                "event=product_delete module=product_store status=error product_id={id} error={err}"
            ),
        }
        result
    }

    /// Loads a product regardless of visibility.
    pub fn get(&self, id: RecordId) -> RepoResult<Product> {
        SqliteProductRepository::new(self.conn)
            .get(id, true)?
            .ok_or(RepoError::not_found("product", id))
    }

    /// Lists visible products matching `options`.
    pub fn find(&self, options: &ProductFindOptions) -> RepoResult<Vec<Product>> {
        SqliteProductRepository::new(self.conn).list(options, false)
    }

    /// Returns the stored attribute rows of one product, by id.
    pub fn attribute_values(&self, product_id: RecordId) -> RepoResult<Vec<ProductAttributeValue>> {
        load_values(self.conn, product_id)
    }

    /// Recomputes the names of every product of one company.
    ///
    /// Used after the company changes its attribute ordering. Returns the
    /// number of products renamed.
    pub fn refresh_names(&mut self, company_id: CompanyId) -> RepoResult<usize> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let products = SqliteProductRepository::new(&tx);

        let ids = products.ids_for_company(company_id)?;
        for &id in &ids {
            let product = products
                .get(id, true)?
                .ok_or(RepoError::not_found("product", id))?;
            let commodity = load_commodity(&tx, product.commodity_id)?;
            persist_name(&tx, &product, &commodity)?;
        }
        tx.commit()?;

        info!(
            "event=product_refresh_names module=product_store status=ok company_id={} count={} duration_ms={}",
            company_id,
            ids.len(),
            started_at.elapsed().as_millis()
        );
        Ok(ids.len())
    }

    fn create_in_tx(
        &mut self,
        product: &Product,
        attribute_values: &[ProductAttributeValue],
    ) -> RepoResult<Product> {
        product.validate()?;
        validate_values(attribute_values)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let commodity = load_commodity(&tx, product.commodity_id)?;

        let mut created = Product::new(product.commodity_id, product.company_id);
        created.id = SqliteProductRepository::new(&tx).insert(&created)?;
        insert_values(&tx, &created, attribute_values)?;
        created.name = persist_name(&tx, &created, &commodity)?;

        tx.commit()?;
        Ok(created)
    }

    fn update_in_tx(
        &mut self,
        product: &Product,
        attribute_values: &[ProductAttributeValue],
    ) -> RepoResult<Product> {
        product.validate()?;
        validate_values(attribute_values)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let products = SqliteProductRepository::new(&tx);
        if products.get(product.id, true)?.is_none() {
            return Err(RepoError::not_found("product", product.id));
        }
        let commodity = load_commodity(&tx, product.commodity_id)?;

        products.update_columns(product)?;
        let mut updated = product.clone();
        if attribute_values.is_empty() {
            ensure_retained_values_apply(&tx, &updated, &commodity)?;
        } else {
            SqliteAttributeValueRepository::new(&tx).delete_for_product(updated.id)?;
            insert_values(&tx, &updated, attribute_values)?;
        }
        updated.name = persist_name(&tx, &updated, &commodity)?;

        tx.commit()?;
        Ok(updated)
    }
}

fn validate_values(attribute_values: &[ProductAttributeValue]) -> RepoResult<()> {
    let mut seen = BTreeSet::new();
    for value in attribute_values {
        value.validate_unbound()?;
        if !seen.insert(value.commodity_attribute_id) {
            return Err(ValidationError::DuplicateAttribute(value.commodity_attribute_id).into());
        }
    }
    Ok(())
}

fn load_commodity(conn: &Connection, commodity_id: RecordId) -> RepoResult<Commodity> {
    SqliteCommodityRepository::new(conn)
        .get_commodity(commodity_id)?
        .ok_or(RepoError::not_found("commodity", commodity_id))
}

fn load_values(conn: &Connection, product_id: RecordId) -> RepoResult<Vec<ProductAttributeValue>> {
    let filter = AttributeValueFilter {
        product_ids: vec![product_id],
        ..AttributeValueFilter::default()
    };
    Ok(SqliteAttributeValueRepository::new(conn).find(&filter)?.items)
}

fn insert_values(
    conn: &Connection,
    product: &Product,
    attribute_values: &[ProductAttributeValue],
) -> RepoResult<()> {
    let values = SqliteAttributeValueRepository::new(conn);
    for value in attribute_values {
        values.create(&value.bound_to(product))?;
    }
    Ok(())
}

/// Rejects a commodity change that would strand rows of another commodity type.
fn ensure_retained_values_apply(
    conn: &Connection,
    product: &Product,
    commodity: &Commodity,
) -> RepoResult<()> {
    let commodities = SqliteCommodityRepository::new(conn);
    for value in load_values(conn, product.id)? {
        let attribute = commodities
            .get_attribute(value.commodity_attribute_id)?
            .ok_or(RepoError::not_found(
                "commodity_attribute",
                value.commodity_attribute_id,
            ))?;
        if !attribute.applies_to(commodity) {
            return Err(ValidationError::AttributeNotApplicable {
                attribute_id: attribute.id,
                commodity_type: commodity.kind.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Composes the name from current rows and ordering, and stores it.
fn persist_name(conn: &Connection, product: &Product, commodity: &Commodity) -> RepoResult<String> {
    let ordering = SqliteOrderingRepository::new(conn).resolve(product.company_id)?;
    let stored = load_values(conn, product.id)?;
    let name = compose_name(commodity, &ordering, &values_by_attribute(&stored));
    SqliteProductRepository::new(conn).set_name(product.id, &name)?;
    Ok(name)
}

fn log_outcome(
    event: &str,
    started_at: Instant,
    result: &RepoResult<Product>,
    company_id: CompanyId,
    attribute_count: usize,
) {
    match result {
        Ok(product) => info!(
            "event={} module=product_store status=ok product_id={} company_id={} attribute_count={} duration_ms={}",
            event,
            product.id,
            company_id,
            attribute_count,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={} module=product_store status=error company_id={} attribute_count={} duration_ms={} error={}",
            event,
            company_id,
            attribute_count,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
