//! Product attribute value repository.
//!
//! # Responsibility
//! - CRUD over `product_attribute_values`, one row per (product, attribute).
//! - Paged lookup by company and product with a total count.
//!
//! # Invariants
//! - Only `value` is mutable after insert.
//! - A row carries its product's company, and its attribute applies to the
//!   product's commodity type.
//! - `delete(&[])` returns before touching storage.
//! - Filters are ANDed; empty filter lists are ignored.

use crate::model::product::ProductAttributeValue;
use crate::model::validation::{require_text, ValidationError};
use crate::model::{CompanyId, RecordId};
use crate::repo::commodity_repo::{CommodityRepository, SqliteCommodityRepository};
use crate::repo::product_repo::{ProductRepository, SqliteProductRepository};
use crate::repo::{placeholders, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const VALUE_SELECT_SQL: &str = "SELECT
    id,
    product_id,
    company_id,
    commodity_attribute_id,
    value
FROM product_attribute_values";

/// Filter for [`AttributeValueStore::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeValueFilter {
    pub company_ids: Vec<CompanyId>,
    pub product_ids: Vec<RecordId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// One page of attribute values plus the unpaged match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValuePage {
    /// Rows ordered by id ascending.
    pub items: Vec<ProductAttributeValue>,
    pub total: u64,
}

/// Repository interface for product attribute values.
pub trait AttributeValueStore {
    /// Inserts one bound row and returns its id.
    fn create(&self, value: &ProductAttributeValue) -> RepoResult<RecordId>;
    /// Replaces the `value` text of the row with `value.id`.
    fn update(&self, value: &ProductAttributeValue) -> RepoResult<()>;
    /// Deletes rows by id and returns how many were removed.
    fn delete(&self, ids: &[RecordId]) -> RepoResult<usize>;
    /// Deletes every row of one product.
    fn delete_for_product(&self, product_id: RecordId) -> RepoResult<usize>;
    fn get(&self, id: RecordId) -> RepoResult<Option<ProductAttributeValue>>;
    fn find(&self, filter: &AttributeValueFilter) -> RepoResult<AttributeValuePage>;
}

/// SQLite-backed attribute value repository.
pub struct SqliteAttributeValueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttributeValueRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AttributeValueStore for SqliteAttributeValueRepository<'_> {
    fn create(&self, value: &ProductAttributeValue) -> RepoResult<RecordId> {
        value.validate()?;
        let product = SqliteProductRepository::new(self.conn)
            .get(value.product_id, true)?
            .ok_or(RepoError::not_found("product", value.product_id))?;
        if product.company_id != value.company_id {
            return Err(ValidationError::CompanyMismatch {
                product_id: product.id,
                expected: product.company_id,
                actual: value.company_id,
            }
            .into());
        }

        let commodities = SqliteCommodityRepository::new(self.conn);
        let attribute = commodities
            .get_attribute(value.commodity_attribute_id)?
            .ok_or(RepoError::not_found(
                "commodity_attribute",
                value.commodity_attribute_id,
            ))?;
        let commodity = commodities
            .get_commodity(product.commodity_id)?
            .ok_or(RepoError::not_found("commodity", product.commodity_id))?;
        if !attribute.applies_to(&commodity) {
            return Err(ValidationError::AttributeNotApplicable {
                attribute_id: attribute.id,
                commodity_type: commodity.kind,
            }
            .into());
        }

        self.conn.execute(
            "INSERT INTO product_attribute_values (
                product_id,
                company_id,
                commodity_attribute_id,
                value
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                value.product_id,
                value.company_id,
                value.commodity_attribute_id,
                value.value.trim(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, value: &ProductAttributeValue) -> RepoResult<()> {
        require_text("product_attribute_value.value", &value.value)?;

        let changed = self.conn.execute(
            "UPDATE product_attribute_values SET value = ?2 WHERE id = ?1;",
            params![value.id, value.value.trim()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("product_attribute_value", value.id));
        }
        Ok(())
    }

    fn delete(&self, ids: &[RecordId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM product_attribute_values WHERE id IN ({});",
            placeholders(ids.len())
        );
        Ok(self.conn.execute(&sql, params_from_iter(ids))?)
    }

    fn delete_for_product(&self, product_id: RecordId) -> RepoResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM product_attribute_values WHERE product_id = ?1;",
            [product_id],
        )?)
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<ProductAttributeValue>> {
        self.conn
            .query_row(
                &format!("{VALUE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_value_row,
            )
            .optional()
            .map_err(RepoError::from)
    }

    fn find(&self, filter: &AttributeValueFilter) -> RepoResult<AttributeValuePage> {
        let mut where_sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !filter.company_ids.is_empty() {
            where_sql.push_str(&format!(
                " AND company_id IN ({})",
                placeholders(filter.company_ids.len())
            ));
            bind_values.extend(filter.company_ids.iter().copied().map(Value::Integer));
        }
        if !filter.product_ids.is_empty() {
            where_sql.push_str(&format!(
                " AND product_id IN ({})",
                placeholders(filter.product_ids.len())
            ));
            bind_values.extend(filter.product_ids.iter().copied().map(Value::Integer));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM product_attribute_values{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!("{VALUE_SELECT_SQL}{where_sql} ORDER BY id ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        } else if filter.offset > 0 {
            sql.push_str(" LIMIT -1");
        }
        if filter.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(filter.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(bind_values), parse_value_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AttributeValuePage {
            items,
            total: total as u64,
        })
    }
}

fn parse_value_row(row: &Row<'_>) -> rusqlite::Result<ProductAttributeValue> {
    Ok(ProductAttributeValue {
        id: row.get("id")?,
        product_id: row.get("product_id")?,
        company_id: row.get("company_id")?,
        commodity_attribute_id: row.get("commodity_attribute_id")?,
        value: row.get("value")?,
    })
}
