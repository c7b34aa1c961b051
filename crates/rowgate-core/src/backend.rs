//! The storage boundary: query descriptions and the backend trait.
//!
//! Everything the convention layer compiles down to lives here, so a
//! backend can be implemented against these types alone without knowing
//! anything about accessor names.

use crate::error::StorageError;
use crate::record::Record;
use crate::value::Value;

/// Comparison operator a clause applies to its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Column equals the bound value
    Eq,
    /// Column matches the bound value as a `LIKE` pattern (`%`, `_`)
    Like,
}

/// A single column constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Normalized column name
    pub column: String,
    pub op: CompareOp,
    /// The bound value
    pub value: Value,
}

impl Clause {
    /// Create an equality clause.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    /// Create a `LIKE` clause. The value is the pattern, wildcards included.
    pub fn like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: CompareOp::Like,
            value: value.into(),
        }
    }
}

/// A backend-agnostic where-condition.
///
/// This is deliberately small: it is the entire language the accessor
/// grammar can produce, and also the escape-hatch type callers pass to the
/// `…ByColumns` accessors. Backends interpret it however suits their store.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    /// No condition; select or affect everything.
    #[default]
    All,
    /// AND-conjoined clauses. An empty list behaves like [`Predicate::All`].
    Clauses(Vec<Clause>),
}

impl Predicate {
    /// The unconditional predicate.
    #[must_use]
    pub fn all() -> Self {
        Predicate::All
    }

    /// A predicate with a single equality clause.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Clauses(vec![Clause::eq(column, value)])
    }

    /// Check whether this predicate constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Clauses(clauses) => clauses.is_empty(),
        }
    }

    /// Iterate the clauses, empty for [`Predicate::All`].
    pub fn clauses(&self) -> &[Clause] {
        match self {
            Predicate::All => &[],
            Predicate::Clauses(clauses) => clauses,
        }
    }
}

impl From<Vec<Clause>> for Predicate {
    fn from(clauses: Vec<Clause>) -> Self {
        Predicate::Clauses(clauses)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One ordering key: a normalized column plus a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

impl SortKey {
    /// Ascending sort on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending sort on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// The backend-agnostic, fully compiled form of one query.
///
/// Produced by the spec builder from a parsed accessor descriptor plus the
/// call arguments; contains no naming-convention residue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySpec {
    /// The where-condition.
    pub predicate: Predicate,
    /// Ordering keys, applied left to right.
    pub order: Vec<SortKey>,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
    /// Column a count operation counts, `None` meaning all rows (`*`).
    ///
    /// Note that for the `countBy`/`countDistinctBy` accessors the named
    /// field selects *what is counted* — it never filters. See the
    /// repository docs.
    pub counted: Option<String>,
    /// Count only distinct values of the counted column.
    pub distinct: bool,
}

/// A storage engine capable of executing compiled query specs.
///
/// This is the external-collaborator seam: the core never prepares SQL or
/// touches connections itself. All methods are synchronous; one backend
/// instance belongs to one unit of work. Failures surface as
/// [`StorageError`] and are propagated to the caller unchanged — the core
/// performs no retries.
pub trait StorageBackend {
    /// Fetch rows matching `predicate`, ordered and windowed.
    fn select(
        &mut self,
        table: &str,
        predicate: &Predicate,
        order: &[SortKey],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, StorageError>;

    /// Insert a row (key column already excluded) and return the
    /// backend-generated identifier.
    fn insert(&mut self, table: &str, row: &Record) -> Result<Value, StorageError>;

    /// Update the row whose `key_column` equals `key` with the given
    /// payload (key column already excluded). Returns rows affected.
    fn update(
        &mut self,
        table: &str,
        row: &Record,
        key_column: &str,
        key: &Value,
    ) -> Result<u64, StorageError>;

    /// Delete rows matching `predicate`. Returns rows affected.
    fn delete(&mut self, table: &str, predicate: &Predicate) -> Result<u64, StorageError>;

    /// Count rows, or non-null values of `column` when given, optionally
    /// only distinct ones.
    fn count(
        &mut self,
        table: &str,
        column: Option<&str>,
        distinct: bool,
        predicate: &Predicate,
    ) -> Result<u64, StorageError>;
}
