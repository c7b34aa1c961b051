//! Rowgate — convention-based data access for Rust.
//!
//! Rowgate turns naming-convention accessor calls into structured queries
//! and keeps an identity-mapped, write-deferring repository on top:
//!
//! - **Accessor names encode queries**: `getByNameAndStatus`,
//!   `getAllByAgeOrderByNameDescLimit10From5`, `countDistinctByEmail`,
//!   `removeByStatus` — parsed once per distinct name, compiled into a
//!   backend-agnostic [`QuerySpec`].
//! - **Identity map**: at most one live [`RecordRef`] per primary key per
//!   repository; every `get*` result is folded into the map, freshest read
//!   wins.
//! - **Unit of work**: [`Repository::persist`] queues records,
//!   [`Repository::flush`] writes them in order; a failed flush reports
//!   exactly how far it got.
//!
//! # Quick Start
//!
//! ```ignore
//! use rowgate::prelude::*;
//! use rowgate_memory::MemoryBackend;
//!
//! let mut repo = Repository::new(MemoryBackend::new(), RepositoryConfig::new("users"));
//!
//! // Queue and flush a new record; the backend assigns its key.
//! let ada = repo.create_from([("name", "Ada"), ("role", "admin")]);
//! repo.persist(&ada);
//! repo.flush()?;
//!
//! // Dynamic accessor dispatch.
//! let admins = repo.call("getAllByRoleOrderByName", args!["admin"])?.into_many();
//! let total = repo.call("count", args![])?.into_count();
//!
//! // Identity-mapped lookup: same handle, no second storage read.
//! let id = ada.read().unwrap().get("id").cloned().unwrap();
//! let again = repo.get(id)?.unwrap();
//! assert!(std::sync::Arc::ptr_eq(&ada, &again));
//! # Ok::<(), rowgate::Error>(())
//! ```
//!
//! Storage engines implement the synchronous [`StorageBackend`] trait;
//! `rowgate-memory` ships an in-memory reference implementation.

pub mod identity;
pub mod repository;

pub use identity::IdentityMap;
pub use repository::{CallOutcome, Repository, RepositoryConfig};

// Re-export the public types from the sub-crates
pub use rowgate_core::{
    ArgumentCountError, Clause, CompareOp, Direction, Error, FlushError, Predicate, QuerySpec,
    Record, RecordRef, Result, SortKey, StorageBackend, StorageError, StorageErrorKind, TypeError,
    Value,
};
pub use rowgate_query::{
    AccessorCache, AccessorDescriptor, AccessorKind, Arg, args, build, normalize, parse,
    split_fields,
};

/// The commonly-needed imports in one place.
pub mod prelude {
    pub use crate::repository::{CallOutcome, Repository, RepositoryConfig};
    pub use rowgate_core::{
        Error, Predicate, Record, RecordRef, Result, StorageBackend, Value,
    };
    pub use rowgate_query::{Arg, args};
}
