//! Catalog domain model.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Own field-level validation rules (`validate()`).
//!
//! # Invariants
//! - Every persisted record is identified by a positive storage-assigned id.
//! - An id of `0` marks a record that has not been persisted yet.
//! - Product deletion is a visibility flip, not a physical delete.

pub mod commodity;
pub mod product;
pub mod validation;

/// Storage-assigned row identifier.
pub type RecordId = i64;
/// Tenant identifier. Companies are owned by an external service.
pub type CompanyId = i64;
