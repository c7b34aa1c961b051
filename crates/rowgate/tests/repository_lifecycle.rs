//! Repository lifecycle: identity map, write queue, flush semantics.

use rowgate::prelude::*;
use rowgate::args;
use rowgate_core::{SortKey, StorageError, StorageErrorKind};
use rowgate_memory::MemoryBackend;
use std::sync::Arc;

fn repo() -> Repository<MemoryBackend> {
    Repository::new(MemoryBackend::new(), RepositoryConfig::new("users"))
}

#[test]
fn persist_flush_assigns_key_and_caches() {
    let mut repo = repo();

    let rec = repo.create_from([("name", "Ada")]);
    repo.persist(&rec);
    assert_eq!(repo.queued(), 1);

    repo.flush().unwrap();
    assert_eq!(repo.queued(), 0);

    let key = rec.read().unwrap().get("id").cloned().expect("key assigned");
    assert!(!key.is_empty_key());

    // get() serves the cached handle without a storage read
    let selects_before = repo.backend().op_counts().selects;
    let again = repo.get(key).unwrap().expect("cached");
    assert!(Arc::ptr_eq(&rec, &again));
    assert_eq!(repo.backend().op_counts().selects, selects_before);
}

#[test]
fn get_reads_storage_once_then_serves_cache() {
    let mut repo = repo();
    let rec = repo.create_from([("name", "Grace")]);
    repo.persist(&rec);
    repo.flush().unwrap();
    let key = rec.read().unwrap().get("id").cloned().unwrap();

    // a second repository over the same data has a cold cache
    let backend = std::mem::take(repo.backend_mut());
    let mut fresh = Repository::new(backend, RepositoryConfig::new("users"));

    let first = fresh.get(key.clone()).unwrap().expect("row exists");
    assert_eq!(fresh.backend().op_counts().selects, 1);

    let second = fresh.get(key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    // still exactly one read
    assert_eq!(fresh.backend().op_counts().selects, 1);

    assert!(fresh.get(9999).unwrap().is_none());
}

#[test]
fn get_accessors_overwrite_cached_handles() {
    let mut repo = repo();
    let rec = repo.create_from([("name", "Alan")]);
    repo.persist(&rec);
    repo.flush().unwrap();
    let key = rec.read().unwrap().get("id").cloned().unwrap();

    // a fresh read replaces the cached handle: last read wins
    let reread = repo
        .call("getByName", args!["Alan"])
        .unwrap()
        .into_one()
        .unwrap();
    assert!(!Arc::ptr_eq(&rec, &reread));

    let cached = repo.get(key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&reread, &cached));
}

#[test]
fn persist_with_key_is_visible_before_flush() {
    let mut repo = repo();

    let rec = repo.create_from([("id", Value::Int(7)), ("name", Value::from("Edsger"))]);
    repo.persist(&rec);

    // observed through the cache without any storage read
    let hit = repo.get(7).unwrap().expect("visible before flush");
    assert!(Arc::ptr_eq(&rec, &hit));
    assert_eq!(repo.backend().op_counts().selects, 0);
    assert_eq!(repo.queued(), 1);
}

#[test]
fn persist_queues_a_handle_only_once() {
    let mut repo = repo();
    let rec = repo.create_from([("name", "Ada")]);

    repo.persist(&rec);
    repo.persist(&rec);
    assert_eq!(repo.queued(), 1);

    repo.flush().unwrap();
    assert_eq!(repo.backend().op_counts().inserts, 1);
}

#[test]
fn flush_writes_in_insertion_order() {
    let mut repo = repo();
    let first = repo.create_from([("name", "first")]);
    let second = repo.create_from([("name", "second")]);
    let third = repo.create_from([("name", "third")]);
    repo.persist_all([
        Arc::clone(&first),
        Arc::clone(&second),
        Arc::clone(&third),
    ]);
    repo.flush().unwrap();

    // generated keys follow queue order
    let key = |r: &RecordRef| r.read().unwrap().get("id").cloned().unwrap();
    assert_eq!(key(&first), Value::Int(1));
    assert_eq!(key(&second), Value::Int(2));
    assert_eq!(key(&third), Value::Int(3));
}

#[test]
fn save_updates_when_key_present() {
    let mut repo = repo();
    let rec = repo.create_from([("name", "Ada"), ("role", "member")]);
    repo.persist(&rec);
    repo.flush().unwrap();
    assert_eq!(repo.backend().op_counts().inserts, 1);

    rec.write().unwrap().set("role", "admin");
    repo.save(&rec).unwrap();

    // second save is an update keyed by the assigned id, not a new insert
    assert_eq!(repo.backend().op_counts().inserts, 1);
    assert_eq!(repo.backend().op_counts().updates, 1);
    assert_eq!(
        repo.backend().rows("users")[0].get("role"),
        Some(&Value::Text("admin".into()))
    );
}

#[test]
fn delete_removes_from_storage_but_not_from_cache() {
    let mut repo = repo();
    let rec = repo.create_from([("name", "Ada")]);
    repo.persist(&rec);
    repo.flush().unwrap();
    let key = rec.read().unwrap().get("id").cloned().unwrap();

    assert_eq!(repo.delete(&rec).unwrap(), 1);
    assert_eq!(repo.backend().rows("users").len(), 0);

    // cache entries live until the repository is dropped
    let cached = repo.get(key).unwrap().expect("still cached");
    assert!(Arc::ptr_eq(&rec, &cached));
}

#[test]
fn delete_rejects_transient_records() {
    let mut repo = repo();
    let rec = repo.create_from([("name", "ghost")]);
    let err = repo.delete(&rec).unwrap_err();
    assert!(matches!(err, Error::Type(_)));
}

// ---------------------------------------------------------------------------
// Partial flush failures
// ---------------------------------------------------------------------------

/// Wraps the memory backend and fails inserts once armed.
#[derive(Default)]
struct FlakyBackend {
    inner: MemoryBackend,
    fail_inserts: bool,
}

impl StorageBackend for FlakyBackend {
    fn select(
        &mut self,
        table: &str,
        predicate: &Predicate,
        order: &[SortKey],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, StorageError> {
        self.inner.select(table, predicate, order, limit, offset)
    }

    fn insert(&mut self, table: &str, row: &Record) -> Result<Value, StorageError> {
        if self.fail_inserts {
            return Err(StorageError::new(
                StorageErrorKind::Connection,
                "connection reset",
            ));
        }
        self.inner.insert(table, row)
    }

    fn update(
        &mut self,
        table: &str,
        row: &Record,
        key_column: &str,
        key: &Value,
    ) -> Result<u64, StorageError> {
        self.inner.update(table, row, key_column, key)
    }

    fn delete(&mut self, table: &str, predicate: &Predicate) -> Result<u64, StorageError> {
        self.inner.delete(table, predicate)
    }

    fn count(
        &mut self,
        table: &str,
        column: Option<&str>,
        distinct: bool,
        predicate: &Predicate,
    ) -> Result<u64, StorageError> {
        self.inner.count(table, column, distinct, predicate)
    }
}

#[test]
fn failed_flush_reports_progress_and_keeps_remainder() {
    let mut repo = Repository::new(FlakyBackend::default(), RepositoryConfig::new("users"));

    let a = repo.create_from([("name", "a")]);
    let b = repo.create_from([("name", "b")]);
    let c = repo.create_from([("name", "c")]);
    repo.persist_all([Arc::clone(&a), Arc::clone(&b), Arc::clone(&c)]);

    // first record lands, then the connection drops
    repo.flush().unwrap();
    assert_eq!(repo.queued(), 0);

    let d = repo.create_from([("name", "d")]);
    let e = repo.create_from([("name", "e")]);
    repo.persist_all([Arc::clone(&d), Arc::clone(&e)]);
    repo.backend_mut().fail_inserts = true;

    let err = repo.flush().unwrap_err();
    match err {
        Error::Flush(report) => {
            assert_eq!(report.flushed, 0);
            assert_eq!(report.remaining, 2);
            assert!(matches!(*report.source, Error::Storage(_)));
        }
        other => panic!("expected Flush, got {other:?}"),
    }
    assert_eq!(repo.queued(), 2);
    // nothing beyond the original three reached storage
    assert_eq!(repo.backend().inner.rows("users").len(), 3);

    // the remainder retries cleanly once the backend recovers
    repo.backend_mut().fail_inserts = false;
    repo.flush().unwrap();
    assert_eq!(repo.queued(), 0);
    assert_eq!(repo.backend().inner.rows("users").len(), 5);
    assert!(d.read().unwrap().get("id").is_some());
    assert!(e.read().unwrap().get("id").is_some());
}

#[test]
fn failed_flush_mid_queue_keeps_failed_record_first() {
    let mut repo = Repository::new(FlakyBackend::default(), RepositoryConfig::new("users"));

    // one record already has a key, so it updates even while inserts fail
    let keyed = repo.create_from([("id", Value::Int(1)), ("name", Value::from("keyed"))]);
    let fresh = repo.create_from([("name", "fresh")]);
    repo.persist(&keyed);
    repo.persist(&fresh);
    repo.backend_mut().fail_inserts = true;

    let err = repo.flush().unwrap_err();
    match err {
        Error::Flush(report) => {
            assert_eq!(report.flushed, 1);
            assert_eq!(report.remaining, 1);
        }
        other => panic!("expected Flush, got {other:?}"),
    }
    assert_eq!(repo.queued(), 1);
}
