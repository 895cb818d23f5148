//! Product row persistence.
//!
//! # Responsibility
//! - Insert and mutate `products` rows on behalf of `ProductStore`.
//! - Provide visibility-aware lookup and filtered listing.
//!
//! # Invariants
//! - `update_columns` never touches `name`; only `set_name` writes it.
//! - Soft delete flips `visible`; rows are never removed here.
//! - Name filters are literal substrings matched with Unicode case folding;
//!   pagination applies after the name filter.

use crate::model::product::Product;
use crate::model::{CompanyId, RecordId};
use crate::repo::{bool_to_int, int_to_bool, placeholders, RepoError, RepoResult};
use regex::{Regex, RegexBuilder};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PRODUCT_SELECT_SQL: &str = "SELECT
    id,
    commodity_id,
    company_id,
    name,
    visible
FROM products";

/// Listing options for products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFindOptions {
    pub company_id: Option<CompanyId>,
    /// Restricts to these ids when non-empty.
    pub ids: Vec<RecordId>,
    /// Case-insensitive substring of the derived name. Whitespace is kept;
    /// an empty string disables the filter.
    pub name_contains: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for product rows.
pub trait ProductRepository {
    /// Inserts a row with an empty name and returns its id.
    fn insert(&self, product: &Product) -> RepoResult<RecordId>;
    /// Updates commodity, company and visibility of an existing row.
    fn update_columns(&self, product: &Product) -> RepoResult<()>;
    fn set_name(&self, id: RecordId, name: &str) -> RepoResult<()>;
    fn soft_delete(&self, id: RecordId) -> RepoResult<()>;
    fn get(&self, id: RecordId, include_hidden: bool) -> RepoResult<Option<Product>>;
    fn list(
        &self,
        options: &ProductFindOptions,
        include_hidden: bool,
    ) -> RepoResult<Vec<Product>>;
    /// Returns ids of all products of one company, hidden ones included.
    fn ids_for_company(&self, company_id: CompanyId) -> RepoResult<Vec<RecordId>>;
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn insert(&self, product: &Product) -> RepoResult<RecordId> {
        product.validate()?;

        self.conn.execute(
            "INSERT INTO products (commodity_id, company_id, name, visible)
             VALUES (?1, ?2, '', ?3);",
            params![
                product.commodity_id,
                product.company_id,
                bool_to_int(product.visible)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_columns(&self, product: &Product) -> RepoResult<()> {
        product.validate()?;

        let changed = self.conn.execute(
            "UPDATE products
             SET
                commodity_id = ?2,
                company_id = ?3,
                visible = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                product.id,
                product.commodity_id,
                product.company_id,
                bool_to_int(product.visible),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("product", product.id));
        }
        Ok(())
    }

    fn set_name(&self, id: RecordId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE products
             SET
                name = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, name],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("product", id));
        }
        Ok(())
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE products
             SET
                visible = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("product", id));
        }
        Ok(())
    }

    fn get(&self, id: RecordId, include_hidden: bool) -> RepoResult<Option<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PRODUCT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR visible = 1);"
        ))?;
        let mut rows = stmt.query(params![id, bool_to_int(include_hidden)])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_product_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(
        &self,
        options: &ProductFindOptions,
        include_hidden: bool,
    ) -> RepoResult<Vec<Product>> {
        let mut sql = format!("{PRODUCT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !include_hidden {
            sql.push_str(" AND visible = 1");
        }
        if let Some(company_id) = options.company_id {
            sql.push_str(" AND company_id = ?");
            bind_values.push(Value::Integer(company_id));
        }
        if !options.ids.is_empty() {
            sql.push_str(&format!(" AND id IN ({})", placeholders(options.ids.len())));
            bind_values.extend(options.ids.iter().copied().map(Value::Integer));
        }
        let matcher = match options.name_contains.as_deref() {
            Some(fragment) if !fragment.is_empty() => Some(name_matcher(fragment)?),
            _ => None,
        };

        sql.push_str(" ORDER BY id ASC");
        // SQLite LIKE only folds ASCII, so name matching and paging happen below.
        if matcher.is_none() {
            if let Some(limit) = options.limit {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            } else if options.offset > 0 {
                sql.push_str(" LIMIT -1");
            }
            if options.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(options.offset)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut products = Vec::new();
        while let Some(row) = rows.next()? {
            products.push(parse_product_row(row)?);
        }

        let Some(matcher) = matcher else {
            return Ok(products);
        };
        let limit = options.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(products
            .into_iter()
            .filter(|product| matcher.is_match(&product.name))
            .skip(options.offset as usize)
            .take(limit)
            .collect())
    }

    fn ids_for_company(&self, company_id: CompanyId) -> RepoResult<Vec<RecordId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM products WHERE company_id = ?1 ORDER BY id ASC;")?;
        let ids = stmt
            .query_map([company_id], |row| row.get(0))?
            .collect::<Result<Vec<RecordId>, _>>()?;
        Ok(ids)
    }
}

fn name_matcher(fragment: &str) -> RepoResult<Regex> {
    RegexBuilder::new(&regex::escape(fragment))
        .case_insensitive(true)
        .build()
        .map_err(|err| RepoError::InvalidData(format!("name filter: {err}")))
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    let product = Product {
        id: row.get("id")?,
        commodity_id: row.get("commodity_id")?,
        company_id: row.get("company_id")?,
        name: row.get("name")?,
        visible: int_to_bool(row.get("visible")?, "products.visible")?,
    };
    product
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("product {}: {err}", product.id)))?;
    Ok(product)
}
