//! Per-company attribute display ordering.
//!
//! # Responsibility
//! - Resolve a company's sparse attribute ranking into an ordered id list.
//! - Replace a company's ranking as one unit.
//!
//! # Invariants
//! - Resolution is ascending by `display_order`, then attribute id.
//! - Reads always hit storage; there is no cache.
//! - An empty result means "no ordering configured", not an error.

use crate::model::commodity::CompanyAttributeSetting;
use crate::model::validation::{require_positive, ValidationError};
use crate::model::{CompanyId, RecordId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Read contract for company attribute settings.
pub trait OrderingResolver {
    /// Returns attribute ids in display order for `company_id`.
    fn resolve(&self, company_id: CompanyId) -> RepoResult<Vec<RecordId>>;
    /// Returns the raw settings rows in display order.
    fn settings(&self, company_id: CompanyId) -> RepoResult<Vec<CompanyAttributeSetting>>;
}

/// SQLite-backed ordering repository.
pub struct SqliteOrderingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderingRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Replaces the full ordering of one company.
    ///
    /// `attribute_ids[i]` receives `display_order = i + 1`. An empty slice
    /// clears the ordering, which puts the company on the fallback naming
    /// path. Must not be called while another transaction is open on the
    /// same connection.
    pub fn set_ordering(
        &self,
        company_id: CompanyId,
        attribute_ids: &[RecordId],
    ) -> RepoResult<Vec<CompanyAttributeSetting>> {
        require_positive("company_attribute_setting.company_id", company_id)?;
        let mut seen = BTreeSet::new();
        for &attribute_id in attribute_ids {
            let setting = CompanyAttributeSetting {
                id: 0,
                company_id,
                commodity_attribute_id: attribute_id,
                display_order: 0,
            };
            setting.validate()?;
            if !seen.insert(attribute_id) {
                return Err(ValidationError::DuplicateAttribute(attribute_id).into());
            }
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM company_attribute_settings WHERE company_id = ?1;",
            [company_id],
        )?;
        for (position, &attribute_id) in attribute_ids.iter().enumerate() {
            if !attribute_exists(&tx, attribute_id)? {
                return Err(RepoError::not_found("commodity_attribute", attribute_id));
            }
            tx.execute(
                "INSERT INTO company_attribute_settings (
                    company_id,
                    commodity_attribute_id,
                    display_order
                ) VALUES (?1, ?2, ?3);",
                params![company_id, attribute_id, position as i64 + 1],
            )?;
        }
        tx.commit()?;

        self.settings(company_id)
    }
}

impl OrderingResolver for SqliteOrderingRepository<'_> {
    fn resolve(&self, company_id: CompanyId) -> RepoResult<Vec<RecordId>> {
        Ok(self
            .settings(company_id)?
            .into_iter()
            .map(|setting| setting.commodity_attribute_id)
            .collect())
    }

    fn settings(&self, company_id: CompanyId) -> RepoResult<Vec<CompanyAttributeSetting>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, commodity_attribute_id, display_order
             FROM company_attribute_settings
             WHERE company_id = ?1
             ORDER BY display_order ASC, commodity_attribute_id ASC;",
        )?;
        let settings = stmt
            .query_map([company_id], |row| {
                Ok(CompanyAttributeSetting {
                    id: row.get("id")?,
                    company_id: row.get("company_id")?,
                    commodity_attribute_id: row.get("commodity_attribute_id")?,
                    display_order: row.get("display_order")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(settings)
    }
}

pub(crate) fn attribute_exists(conn: &Connection, attribute_id: RecordId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM commodity_attributes WHERE id = ?1);",
        [attribute_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
