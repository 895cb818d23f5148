//! Commodity and commodity-attribute repository.
//!
//! # Responsibility
//! - Maintain commodity and attribute definitions.
//! - Serve the commodity lookup consumed by product composition.
//!
//! # Invariants
//! - Names are globally unique; collisions surface as `RepoError::Duplicate`.
//! - Commodities are hidden, never physically removed.

use crate::model::commodity::{Commodity, CommodityAttribute};
use crate::model::RecordId;
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COMMODITY_SELECT_SQL: &str = "SELECT id, name, type, visible FROM commodities";
const ATTRIBUTE_SELECT_SQL: &str = "SELECT id, name, commodity_type FROM commodity_attributes";

/// Repository interface for commodity definitions.
pub trait CommodityRepository {
    fn create_commodity(&self, commodity: &Commodity) -> RepoResult<RecordId>;
    /// Loads one commodity regardless of visibility.
    fn get_commodity(&self, id: RecordId) -> RepoResult<Option<Commodity>>;
    fn list_commodities(&self, include_hidden: bool) -> RepoResult<Vec<Commodity>>;
    fn hide_commodity(&self, id: RecordId) -> RepoResult<()>;
    fn create_attribute(&self, attribute: &CommodityAttribute) -> RepoResult<RecordId>;
    fn get_attribute(&self, id: RecordId) -> RepoResult<Option<CommodityAttribute>>;
    /// Lists attributes applicable to one commodity type, by id.
    fn list_attributes(&self, commodity_type: &str) -> RepoResult<Vec<CommodityAttribute>>;
}

/// SQLite-backed commodity repository.
pub struct SqliteCommodityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommodityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommodityRepository for SqliteCommodityRepository<'_> {
    fn create_commodity(&self, commodity: &Commodity) -> RepoResult<RecordId> {
        commodity.validate()?;

        self.conn.execute(
            "INSERT INTO commodities (name, type, visible) VALUES (?1, ?2, ?3);",
            params![
                commodity.name.trim(),
                commodity.kind.trim(),
                bool_to_int(commodity.visible)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_commodity(&self, id: RecordId) -> RepoResult<Option<Commodity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMODITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_commodity_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_commodities(&self, include_hidden: bool) -> RepoResult<Vec<Commodity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMODITY_SELECT_SQL}
             WHERE (?1 = 1 OR visible = 1)
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_hidden)])?;
        let mut commodities = Vec::new();
        while let Some(row) = rows.next()? {
            commodities.push(parse_commodity_row(row)?);
        }
        Ok(commodities)
    }

    fn hide_commodity(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE commodities
             SET
                visible = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("commodity", id));
        }
        Ok(())
    }

    fn create_attribute(&self, attribute: &CommodityAttribute) -> RepoResult<RecordId> {
        attribute.validate()?;

        self.conn.execute(
            "INSERT INTO commodity_attributes (name, commodity_type) VALUES (?1, ?2);",
            params![attribute.name.trim(), attribute.commodity_type.trim()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_attribute(&self, id: RecordId) -> RepoResult<Option<CommodityAttribute>> {
        self.conn
            .query_row(
                &format!("{ATTRIBUTE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_attribute_row,
            )
            .optional()
            .map_err(RepoError::from)
    }

    fn list_attributes(&self, commodity_type: &str) -> RepoResult<Vec<CommodityAttribute>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_SELECT_SQL} WHERE commodity_type = ?1 ORDER BY id ASC;"
        ))?;
        let attributes = stmt
            .query_map([commodity_type], parse_attribute_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attributes)
    }
}

fn parse_commodity_row(row: &Row<'_>) -> RepoResult<Commodity> {
    Ok(Commodity {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: row.get("type")?,
        visible: int_to_bool(row.get("visible")?, "commodities.visible")?,
    })
}

fn parse_attribute_row(row: &Row<'_>) -> rusqlite::Result<CommodityAttribute> {
    Ok(CommodityAttribute {
        id: row.get("id")?,
        name: row.get("name")?,
        commodity_type: row.get("commodity_type")?,
    })
}
