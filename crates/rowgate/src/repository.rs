//! The entity repository: identity map, write queue, and accessor dispatch.
//!
//! A [`Repository`] is the single point of access to one storage-backed
//! collection of records within one unit of work. It routes dynamic
//! accessor calls through the parse → build → execute pipeline, folds every
//! row a `get*` accessor returns into the identity map, and defers writes
//! queued with [`Repository::persist`] until [`Repository::flush`].
//!
//! One repository instance assumes single-threaded use for its lifetime and
//! never shares cache state with another instance.

use crate::identity::IdentityMap;
use rowgate_core::{
    Error, FlushError, Predicate, Record, RecordRef, Result, StorageBackend, TypeError, Value,
};
use rowgate_query::{AccessorCache, AccessorKind, Arg, build};
use std::sync::Arc;
use tracing::{debug, warn};

/// Construction-time configuration: table name, primary-key field.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub table: String,
    pub primary_key: String,
}

impl RepositoryConfig {
    /// Configuration for a table, with the primary key defaulting to `id`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: "id".to_string(),
        }
    }

    /// Use a different primary-key field.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }
}

/// What a dynamic accessor call produced.
#[derive(Debug)]
pub enum CallOutcome {
    /// A single-record accessor: the record, or `None` when nothing matched.
    One(Option<RecordRef>),
    /// A list accessor: every matching record, possibly empty.
    Many(Vec<RecordRef>),
    /// A count or remove accessor: the counted or affected row count.
    Count(u64),
}

impl CallOutcome {
    /// The single record, if this was a single-record accessor that hit.
    pub fn into_one(self) -> Option<RecordRef> {
        match self {
            CallOutcome::One(record) => record,
            _ => None,
        }
    }

    /// The record list, empty unless this was a list accessor.
    pub fn into_many(self) -> Vec<RecordRef> {
        match self {
            CallOutcome::Many(records) => records,
            _ => Vec::new(),
        }
    }

    /// The integer result, if this was a count or remove accessor.
    pub fn into_count(self) -> Option<u64> {
        match self {
            CallOutcome::Count(n) => Some(n),
            _ => None,
        }
    }
}

/// Identity-mapped repository over one storage-backed table.
///
/// # Dynamic accessors
///
/// [`Repository::call`] accepts any name the accessor grammar recognizes:
///
/// ```ignore
/// let admins = repo.call("getAllByRoleOrderByNameLimit20", args!["admin"])?.into_many();
/// let total = repo.call("count", args![])?.into_count();
/// ```
///
/// Every record a `get*` accessor returns is installed in the identity map
/// keyed by its primary-key value before the result is handed back, so the
/// freshest read always wins.
///
/// Note that `countBy<Field>` and `countDistinctBy<Field>` select *what is
/// counted* — they never filter rows. `countByEmail` counts non-null
/// `email` values across the whole table.
///
/// # Unit of work
///
/// [`Repository::persist`] queues records; [`Repository::flush`] writes the
/// queue in insertion order. The queue is in-memory only: dropping the
/// repository before flushing silently discards queued writes.
pub struct Repository<B: StorageBackend> {
    backend: B,
    table: String,
    primary_key: String,
    identity: IdentityMap,
    queue: Vec<RecordRef>,
    accessors: AccessorCache,
}

impl<B: StorageBackend> Repository<B> {
    /// Create a repository over a backend.
    pub fn new(backend: B, config: RepositoryConfig) -> Self {
        Self {
            backend,
            table: config.table,
            primary_key: config.primary_key,
            identity: IdentityMap::new(),
            queue: Vec::new(),
            accessors: AccessorCache::default(),
        }
    }

    /// The configured table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The configured primary-key field name.
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key
    }

    /// Borrow the storage backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutably borrow the storage backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of records waiting for a flush.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of records held in the identity map.
    pub fn cached(&self) -> usize {
        self.identity.len()
    }

    /// Instantiate a new, empty, uncached and unqueued record.
    pub fn create(&self) -> RecordRef {
        Record::new().into_shared()
    }

    /// Instantiate a new record populated from the given field pairs.
    /// Like [`Repository::create`], it is neither cached nor queued.
    pub fn create_from<K, V, I>(&self, pairs: I) -> RecordRef
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Record::from_pairs(pairs).into_shared()
    }

    /// Get a record by primary key.
    ///
    /// Returns the cached handle when one exists — no staleness check and
    /// no storage read. Otherwise issues a primary-key lookup, caches the
    /// row under its own key, and returns it; `Ok(None)` when no row
    /// exists.
    pub fn get(&mut self, id: impl Into<Value>) -> Result<Option<RecordRef>> {
        let id = id.into();
        if let Some(hit) = self.identity.get(&id) {
            return Ok(Some(hit));
        }

        let predicate = Predicate::eq(self.primary_key.clone(), id);
        let rows = self
            .backend
            .select(&self.table, &predicate, &[], Some(1), None)?;
        Ok(rows.into_iter().next().map(|row| self.admit(row)))
    }

    /// Dispatch a dynamic accessor call.
    ///
    /// The name is parsed against the accessor grammar (memoized per
    /// distinct name), combined with `args` into a query spec, and executed
    /// against the backend. `get*` results are folded into the identity
    /// map as a side effect.
    pub fn call(&mut self, name: &str, args: Vec<Arg>) -> Result<CallOutcome> {
        let desc = self.accessors.get_or_parse(name)?;
        let spec = build(&desc, args)?;
        debug!(accessor = name, kind = ?desc.kind, "dispatching accessor");

        match desc.kind {
            AccessorKind::GetOne | AccessorKind::GetLike => {
                let rows = self.backend.select(
                    &self.table,
                    &spec.predicate,
                    &spec.order,
                    spec.limit,
                    spec.offset,
                )?;
                let first = rows.into_iter().next().map(|row| self.admit(row));
                Ok(CallOutcome::One(first))
            }
            AccessorKind::GetAll | AccessorKind::GetAllLike => {
                let rows = self.backend.select(
                    &self.table,
                    &spec.predicate,
                    &spec.order,
                    spec.limit,
                    spec.offset,
                )?;
                let records = rows.into_iter().map(|row| self.admit(row)).collect();
                Ok(CallOutcome::Many(records))
            }
            AccessorKind::Count | AccessorKind::CountBy | AccessorKind::CountDistinctBy => {
                let n = self.backend.count(
                    &self.table,
                    spec.counted.as_deref(),
                    spec.distinct,
                    &spec.predicate,
                )?;
                Ok(CallOutcome::Count(n))
            }
            AccessorKind::RemoveBy => {
                let n = self.backend.delete(&self.table, &spec.predicate)?;
                Ok(CallOutcome::Count(n))
            }
        }
    }

    /// Queue a record for the next [`Repository::flush`].
    ///
    /// A handle already queued is not queued twice. A record that already
    /// carries a primary-key value is additionally installed in the
    /// identity map immediately, so `get()` observes it before the flush.
    pub fn persist(&mut self, record: &RecordRef) {
        if self.queue.iter().any(|queued| Arc::ptr_eq(queued, record)) {
            return;
        }
        if let Some(key) = self.key_of(record) {
            self.identity.insert(key, Arc::clone(record));
        }
        self.queue.push(Arc::clone(record));
    }

    /// Queue several records, preserving iteration order.
    pub fn persist_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = RecordRef>,
    {
        for record in records {
            self.persist(&record);
        }
    }

    /// Write the queue to storage in insertion order, then empty it.
    ///
    /// Not atomic: when a save fails, everything written so far stays
    /// written, the failing record and its successors stay queued, and the
    /// returned [`FlushError`] reports both counts. Calling `flush()`
    /// again retries exactly the remainder.
    pub fn flush(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        debug!(queued = self.queue.len(), "flushing write queue");

        let queue = std::mem::take(&mut self.queue);
        for (i, record) in queue.iter().enumerate() {
            if let Err(source) = self.save(record) {
                self.queue = queue[i..].to_vec();
                warn!(
                    flushed = i,
                    remaining = self.queue.len(),
                    "flush stopped by save failure"
                );
                return Err(Error::Flush(FlushError {
                    flushed: i,
                    remaining: self.queue.len(),
                    source: Box::new(source),
                }));
            }
        }
        Ok(())
    }

    /// Save one record directly, bypassing the queue.
    ///
    /// A record with a primary-key value is updated under that key (the key
    /// field itself excluded from the payload); a transient record is
    /// inserted, and the backend-generated identifier is written back into
    /// it before returning. Either way the record ends up in the identity
    /// map under its (possibly new) key.
    pub fn save(&mut self, record: &RecordRef) -> Result<()> {
        let (payload, key) = {
            let rec = record.read().expect("record lock poisoned");
            (rec.without(&self.primary_key), self.nonempty_key(&rec))
        };

        match key {
            Some(key) => {
                self.backend
                    .update(&self.table, &payload, &self.primary_key, &key)?;
                debug!(table = %self.table, "updated record");
                self.identity.insert(key, Arc::clone(record));
            }
            None => {
                let key = self.backend.insert(&self.table, &payload)?;
                debug!(table = %self.table, "inserted record");
                record
                    .write()
                    .expect("record lock poisoned")
                    .set(self.primary_key.clone(), key.clone());
                self.identity.insert(key, Arc::clone(record));
            }
        }
        Ok(())
    }

    /// Delete a record from storage by its primary key.
    ///
    /// Returns the backend's affected-row count. Fails on a transient
    /// record. The identity map keeps its entry: records are only evicted
    /// when the repository itself is dropped.
    pub fn delete(&mut self, record: &RecordRef) -> Result<u64> {
        let Some(key) = self.key_of(record) else {
            return Err(Error::Type(TypeError {
                expected: "a record with a primary-key value",
                actual: "a transient record".to_string(),
                context: Some("delete".to_string()),
            }));
        };
        let predicate = Predicate::eq(self.primary_key.clone(), key);
        Ok(self.backend.delete(&self.table, &predicate)?)
    }

    /// Install a freshly loaded row into the identity map (keyed by its own
    /// primary-key value) and return its handle. The newest row replaces
    /// any handle previously cached for the same key.
    fn admit(&mut self, row: Record) -> RecordRef {
        let key = self.nonempty_key(&row);
        let record = row.into_shared();
        if let Some(key) = key {
            self.identity.insert(key, Arc::clone(&record));
        }
        record
    }

    fn key_of(&self, record: &RecordRef) -> Option<Value> {
        let rec = record.read().expect("record lock poisoned");
        self.nonempty_key(&rec)
    }

    fn nonempty_key(&self, record: &Record) -> Option<Value> {
        record
            .get(&self.primary_key)
            .filter(|value| !value.is_empty_key())
            .cloned()
    }
}
