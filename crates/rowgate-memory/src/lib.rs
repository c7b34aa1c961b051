//! In-memory storage backend for Rowgate.
//!
//! [`MemoryBackend`] implements the full `StorageBackend` contract against
//! plain vectors of records: predicate filtering (equality and SQL-style
//! `LIKE`), multi-key stable ordering, limit/offset windows, generated
//! integer keys, and the three count shapes (`*`, column, distinct column).
//!
//! It is the reference backend the facade's integration tests run against;
//! every operation is counted so tests can assert how often storage was
//! actually hit.

use regex::Regex;
use rowgate_core::{
    CompareOp, Direction, Predicate, Record, SortKey, StorageBackend, StorageError,
    StorageErrorKind, Value,
};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-operation call counters, for test instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    pub selects: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub counts: u64,
}

#[derive(Debug, Default)]
struct Table {
    key_column: String,
    rows: Vec<Record>,
    next_key: i64,
}

impl Table {
    fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            rows: Vec::new(),
            next_key: 1,
        }
    }
}

/// An in-memory storage engine.
///
/// Tables spring into existence on first write with an `id` key column;
/// use [`MemoryBackend::with_table`] to declare a different key column
/// up front.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: HashMap<String, Table>,
    ops: OpCounts,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table with an explicit generated-key column.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, key_column: impl Into<String>) -> Self {
        self.tables.insert(name.into(), Table::new(key_column));
        self
    }

    /// The call counters accumulated so far.
    pub fn op_counts(&self) -> OpCounts {
        self.ops
    }

    /// Current rows of a table, in insertion order. Empty if the table has
    /// never been written.
    pub fn rows(&self, table: &str) -> &[Record] {
        self.tables.get(table).map_or(&[], |t| t.rows.as_slice())
    }

    fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new("id"))
    }
}

impl StorageBackend for MemoryBackend {
    fn select(
        &mut self,
        table: &str,
        predicate: &Predicate,
        order: &[SortKey],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, StorageError> {
        self.ops.selects += 1;

        let rows = self.tables.get(table).map_or(&[][..], |t| t.rows.as_slice());
        let mut matched = Vec::new();
        for row in rows {
            if matches_predicate(row, predicate)? {
                matched.push(row.clone());
            }
        }

        if !order.is_empty() {
            matched.sort_by(|a, b| cmp_rows(a, b, order));
        }

        let skip = offset.unwrap_or(0) as usize;
        let take = limit.map_or(usize::MAX, |l| l as usize);
        Ok(matched.into_iter().skip(skip).take(take).collect())
    }

    fn insert(&mut self, table: &str, row: &Record) -> Result<Value, StorageError> {
        self.ops.inserts += 1;

        let table = self.table_mut(table);
        let key = Value::Int(table.next_key);
        table.next_key += 1;

        let mut stored = row.clone();
        stored.set(table.key_column.clone(), key.clone());
        table.rows.push(stored);
        Ok(key)
    }

    fn update(
        &mut self,
        table: &str,
        row: &Record,
        key_column: &str,
        key: &Value,
    ) -> Result<u64, StorageError> {
        self.ops.updates += 1;

        let table = self.table_mut(table);
        let mut affected = 0;
        for stored in &mut table.rows {
            let hit = stored.get(key_column).is_some_and(|v| values_equal(v, key));
            if hit {
                for (name, value) in row.iter() {
                    stored.set(name, value.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn delete(&mut self, table: &str, predicate: &Predicate) -> Result<u64, StorageError> {
        self.ops.deletes += 1;

        let Some(table) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = table.rows.len();
        let mut error = None;
        table.rows.retain(|row| {
            if error.is_some() {
                return true;
            }
            match matches_predicate(row, predicate) {
                Ok(hit) => !hit,
                Err(e) => {
                    error = Some(e);
                    true
                }
            }
        });
        if let Some(e) = error {
            return Err(e);
        }
        Ok((before - table.rows.len()) as u64)
    }

    fn count(
        &mut self,
        table: &str,
        column: Option<&str>,
        distinct: bool,
        predicate: &Predicate,
    ) -> Result<u64, StorageError> {
        self.ops.counts += 1;

        let rows = self.tables.get(table).map_or(&[][..], |t| t.rows.as_slice());
        let mut matched = Vec::new();
        for row in rows {
            if matches_predicate(row, predicate)? {
                matched.push(row);
            }
        }

        let Some(column) = column else {
            return Ok(matched.len() as u64);
        };

        // COUNT(col) counts non-null values; DISTINCT collapses duplicates
        let values = matched
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_null());
        if distinct {
            let mut seen: Vec<&Value> = Vec::new();
            for v in values {
                if !seen.iter().any(|s| values_equal(s, v)) {
                    seen.push(v);
                }
            }
            Ok(seen.len() as u64)
        } else {
            Ok(values.count() as u64)
        }
    }
}

fn matches_predicate(row: &Record, predicate: &Predicate) -> Result<bool, StorageError> {
    for clause in predicate.clauses() {
        let value = row.get(&clause.column);
        let hit = match clause.op {
            CompareOp::Eq => value.is_some_and(|v| values_equal(v, &clause.value)),
            CompareOp::Like => match value {
                Some(Value::Text(text)) => {
                    let pattern = clause.value.as_str().ok_or_else(|| {
                        StorageError::new(
                            StorageErrorKind::InvalidQuery,
                            format!(
                                "LIKE pattern for column {} must be text, got {}",
                                clause.column,
                                clause.value.type_name()
                            ),
                        )
                    })?;
                    like_matches(pattern, text)?
                }
                _ => false,
            },
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality with numeric coercion between integers and floats, the way SQL
/// comparison behaves. NULL never equals anything, including NULL.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Int(x), Value::Float(y)) => (*x as f64) == *y,
        (Value::Float(x), Value::Int(y)) => *x == (*y as f64),
        (Value::Bool(x), Value::Int(y)) => i64::from(*x) == *y,
        (Value::Int(x), Value::Bool(y)) => *x == i64::from(*y),
        _ => a == b,
    }
}

/// Evaluate a SQL `LIKE` pattern (`%` any run, `_` any single character),
/// case-insensitively, by translating it to an anchored regex.
fn like_matches(pattern: &str, text: &str) -> Result<bool, StorageError> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?is)^");
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');

    let compiled = Regex::new(&regex).map_err(|e| {
        StorageError::new(
            StorageErrorKind::InvalidQuery,
            format!("bad LIKE pattern {pattern:?}"),
        )
        .with_source(e)
    })?;
    Ok(compiled.is_match(text))
}

fn cmp_rows(a: &Record, b: &Record, order: &[SortKey]) -> Ordering {
    for key in order {
        let ordering = cmp_values(a.get(&key.column), b.get(&key.column));
        let ordering = match key.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total ordering over optional values: missing and NULL sort first, then
/// same-type comparison, with integers and floats comparing numerically.
/// Mixed types fall back to a fixed type rank so sorting stays stable.
fn cmp_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => return Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => return Ordering::Less,
        (Some(_), None | Some(Value::Null)) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Int(x), Value::Float(y)) => {
            (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Value::Float(x), Value::Int(y)) => {
            x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal)
        }
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

const fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
        Value::Bytes(_) => 4,
        Value::Json(_) => 5,
    }
}
