//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//! - Classify storage failures into the catalog error taxonomy.
//!
//! # Invariants
//! - Repository writes call the record's `validate()` before SQL mutations.
//! - Repositories never open nested transactions; callers that need one unit
//!   of work hand in a `Transaction` (it derefs to `Connection`).
//! - UNIQUE violations surface as `RepoError::Duplicate`, never as `Db`.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attribute_value_repo;
pub mod commodity_repo;
pub mod ordering_repo;
pub mod product_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy shared by every catalog repository and service.
#[derive(Debug)]
pub enum RepoError {
    /// Caller-correctable input problem.
    Validation(ValidationError),
    /// Referenced record does not exist.
    NotFound { entity: &'static str, id: RecordId },
    /// Uniqueness violation reported by storage.
    Duplicate(String),
    /// Any other storage failure.
    Db(DbError),
    /// Persisted row cannot be decoded into a valid record.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: RecordId) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate(message) => write!(f, "duplicate record: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Duplicate(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_unique_violation(&value) {
            return Self::Duplicate(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Returns `?, ?, ...` with `count` placeholders for `IN (...)` clauses.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
