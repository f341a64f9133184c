//! # shilp-core
//!
//! Core types for the Shilp vector database client.
//!
//! This crate provides:
//! - The error taxonomy shared by every client operation
//! - Closed wire enumerations (integer- and string-coded)
//! - Compound filter and sort expressions with their canonical wire form
//! - Typed request and response models for every endpoint
//!
//! It performs no I/O; see `shilp-client` for the HTTP side.

pub mod defaults;
pub mod error;
pub mod models;
pub mod query;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use query::{AttrValue, CompoundFilter, CompoundSort, FilterExpression, SortExpression};
