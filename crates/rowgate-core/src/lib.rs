//! Core types and traits for Rowgate.
//!
//! This crate provides the foundational abstractions shared by every layer:
//!
//! - [`Value`] — dynamically-typed field values
//! - [`Record`] — the ordered, schema-less keyed-property record
//! - [`StorageBackend`] — the seam to the storage engine, together with the
//!   compiled query types ([`Predicate`], [`QuerySpec`], [`SortKey`])
//! - [`Error`] — the workspace-wide error taxonomy

pub mod backend;
pub mod error;
pub mod record;
pub mod value;

pub use backend::{Clause, CompareOp, Direction, Predicate, QuerySpec, SortKey, StorageBackend};
pub use error::{
    ArgumentCountError, Error, FlushError, Result, StorageError, StorageErrorKind, TypeError,
};
pub use record::{Record, RecordRef};
pub use value::Value;
