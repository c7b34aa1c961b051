//! End-to-end accessor dispatch over the in-memory backend.

use rowgate::prelude::*;
use rowgate::args;
use rowgate_memory::MemoryBackend;
use std::sync::Arc;

fn user(name: &str, age: i64, role: &str, email: Option<&str>) -> Record {
    Record::from_pairs([
        ("name", Value::from(name)),
        ("age", Value::from(age)),
        ("role", Value::from(role)),
        ("email", Value::from(email)),
    ])
}

fn seeded_repo() -> Repository<MemoryBackend> {
    let mut repo = Repository::new(MemoryBackend::new(), RepositoryConfig::new("users"));
    for rec in [
        user("Ada", 36, "admin", Some("ada@example.com")),
        user("Grace", 45, "admin", Some("grace@example.com")),
        user("Alan", 41, "member", Some("alan@example.com")),
        user("Edsger", 36, "member", None),
        user("Barbara", 41, "member", Some("ada@example.com")),
    ] {
        repo.persist(&rec.into_shared());
    }
    repo.flush().expect("seed flush");
    repo
}

fn name_of(record: &RecordRef) -> String {
    record
        .read()
        .unwrap()
        .get("name")
        .and_then(|v| v.as_str().map(String::from))
        .unwrap()
}

#[test]
fn get_by_binds_fields_positionally() {
    let mut repo = seeded_repo();

    let hit = repo
        .call("getByNameAndRole", args!["Ada", "admin"])
        .unwrap()
        .into_one()
        .expect("Ada is an admin");
    assert_eq!(name_of(&hit), "Ada");

    let miss = repo
        .call("getByNameAndRole", args!["Ada", "member"])
        .unwrap()
        .into_one();
    assert!(miss.is_none());
}

#[test]
fn get_all_by_with_order_limit_offset() {
    let mut repo = seeded_repo();

    let members = repo
        .call("getAllByRoleOrderByNameDescLimit2From1", args!["member"])
        .unwrap()
        .into_many();
    // members sorted desc: Edsger, Barbara, Alan; skip 1, take 2
    let names: Vec<_> = members.iter().map(name_of).collect();
    assert_eq!(names, vec!["Barbara", "Alan"]);
}

#[test]
fn get_all_without_condition_returns_everything() {
    let mut repo = seeded_repo();
    let everyone = repo.call("getAll", args![]).unwrap().into_many();
    assert_eq!(everyone.len(), 5);

    let window = repo
        .call("getAllOrderByNameLimit2", args![])
        .unwrap()
        .into_many();
    let names: Vec<_> = window.iter().map(name_of).collect();
    assert_eq!(names, vec!["Ada", "Alan"]);
}

#[test]
fn columns_accessors_take_a_raw_condition() {
    let mut repo = seeded_repo();

    let raw = Predicate::Clauses(vec![
        rowgate::Clause::eq("age", 41),
        rowgate::Clause::eq("role", "member"),
    ]);
    let rows = repo
        .call("getAllByColumnsOrderByName", args![raw])
        .unwrap()
        .into_many();
    let names: Vec<_> = rows.iter().map(name_of).collect();
    assert_eq!(names, vec!["Alan", "Barbara"]);

    let one = repo
        .call("getByColumns", args![Predicate::eq("name", "Grace")])
        .unwrap()
        .into_one()
        .expect("Grace exists");
    assert_eq!(name_of(&one), "Grace");
}

#[test]
fn like_accessors_match_patterns() {
    let mut repo = seeded_repo();

    let a_names = repo
        .call("getAllLikeNameOrderByName", args!["a%"])
        .unwrap()
        .into_many();
    let names: Vec<_> = a_names.iter().map(name_of).collect();
    assert_eq!(names, vec!["Ada", "Alan"]);

    let first = repo
        .call("getLikeName", args!["%race"])
        .unwrap()
        .into_one()
        .expect("Grace matches");
    assert_eq!(name_of(&first), "Grace");
}

#[test]
fn count_family_never_filters() {
    let mut repo = seeded_repo();

    assert_eq!(repo.call("count", args![]).unwrap().into_count(), Some(5));

    // COUNT(email): Edsger has none
    assert_eq!(
        repo.call("countByEmail", args![]).unwrap().into_count(),
        Some(4)
    );

    // Ada and Barbara share an address
    assert_eq!(
        repo.call("countDistinctByEmail", args![])
            .unwrap()
            .into_count(),
        Some(3)
    );

    // arguments to a count accessor are rejected, not treated as a filter
    let err = repo
        .call("countByEmail", args!["ada@example.com"])
        .unwrap_err();
    assert!(matches!(err, Error::ArgumentCount(_)));
}

#[test]
fn remove_by_returns_affected_rows() {
    let mut repo = seeded_repo();

    let removed = repo
        .call("removeByRole", args!["member"])
        .unwrap()
        .into_count();
    assert_eq!(removed, Some(3));
    assert_eq!(repo.call("count", args![]).unwrap().into_count(), Some(2));

    let removed = repo
        .call("removeByRole", args!["nobody"])
        .unwrap()
        .into_count();
    assert_eq!(removed, Some(0));
}

#[test]
fn unrecognized_accessor_fails() {
    let mut repo = seeded_repo();
    let err = repo.call("fetchAllTheThings", args![]).unwrap_err();
    match err {
        Error::UnrecognizedAccessor { name } => assert_eq!(name, "fetchAllTheThings"),
        other => panic!("expected UnrecognizedAccessor, got {other:?}"),
    }
}

#[test]
fn argument_mismatch_fails_before_binding() {
    let mut repo = seeded_repo();
    let err = repo
        .call("getByNameAndRole", args!["onlyOneArg"])
        .unwrap_err();
    match err {
        Error::ArgumentCount(e) => {
            assert_eq!(e.expected, 2);
            assert_eq!(e.supplied, 1);
        }
        other => panic!("expected ArgumentCount, got {other:?}"),
    }
    // nothing was executed against storage
    assert_eq!(repo.backend().op_counts().selects, 0);
}

#[test]
fn get_results_are_identity_mapped() {
    let mut repo = seeded_repo();

    let ada = repo
        .call("getByName", args!["Ada"])
        .unwrap()
        .into_one()
        .unwrap();
    let id = ada.read().unwrap().get("id").cloned().unwrap();

    // the cached handle is the one the accessor returned
    let again = repo.get(id).unwrap().unwrap();
    assert!(Arc::ptr_eq(&ada, &again));
}

#[test]
fn repeated_dispatch_is_memoized() {
    let mut repo = seeded_repo();
    for _ in 0..3 {
        repo.call("getAllByRole", args!["admin"]).unwrap();
    }
    // memoization is per distinct name; storage is still hit every time
    assert_eq!(repo.backend().op_counts().selects, 3);
}
