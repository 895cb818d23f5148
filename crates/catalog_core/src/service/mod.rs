//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own derived-state rules (product names) that span several tables.

pub mod name_composer;
pub mod product_store;
