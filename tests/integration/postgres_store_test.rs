//! PostgreSQL store and resolver tests
//!
//! These need a migrated database reachable through `TEST_DATABASE_URL`;
//! run them with `cargo test -p archivist-integration-tests -- --ignored`.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use archivist_repositories::{
    PgRepositoryStore, Repository, RepositoryField, RepositoryResolver, RepositoryStore,
};

use crate::common::TestDb;

fn set(list: &[String]) -> BTreeSet<String> {
    list.iter().cloned().collect()
}

#[tokio::test]
#[ignore] // Requires PostgreSQL - run locally only
async fn test_resolve_creates_then_merges() {
    let db = TestDb::new().await.unwrap();
    let store = PgRepositoryStore::new(db.pool.clone());
    let resolver = RepositoryResolver::new(Arc::new(store.clone()));

    let first = resolver
        .resolve(&db.endpoints(&["a", "b"]), Some(true))
        .await
        .unwrap();
    let stored = store.find(first).await.unwrap().unwrap();
    assert_eq!(set(&stored.endpoints), set(&db.endpoints(&["a", "b"])));
    assert_eq!(stored.is_fork, Some(true));

    let second = resolver
        .resolve(&db.endpoints(&["b", "c"]), Some(false))
        .await
        .unwrap();
    assert_eq!(first, second);

    let stored = store.find(first).await.unwrap().unwrap();
    assert_eq!(set(&stored.endpoints), set(&db.endpoints(&["a", "b", "c"])));
    assert_eq!(stored.is_fork, Some(true));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL - run locally only
async fn test_resolve_same_endpoints_does_not_touch_row() {
    let db = TestDb::new().await.unwrap();
    let store = PgRepositoryStore::new(db.pool.clone());
    let resolver = RepositoryResolver::new(Arc::new(store.clone()));

    let id = resolver
        .resolve(&db.endpoints(&["a", "b"]), None)
        .await
        .unwrap();
    let before = store.find(id).await.unwrap().unwrap();

    resolver
        .resolve(&db.endpoints(&["b", "a"]), None)
        .await
        .unwrap();
    let after = store.find(id).await.unwrap().unwrap();

    assert_eq!(before.updated_at, after.updated_at);
    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL - run locally only
async fn test_overlap_query_orders_by_id() {
    let db = TestDb::new().await.unwrap();
    let store = PgRepositoryStore::new(db.pool.clone());

    let a = Repository::new(&db.endpoints(&["a"]), None);
    let b = Repository::new(&db.endpoints(&["b"]), None);
    store.insert(&a).await.unwrap();
    store.insert(&b).await.unwrap();

    let found = store
        .find_by_endpoint_overlap(&db.endpoints(&["b", "a", "zzz"]))
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|r| r.id).collect();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(ids, expected);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL - run locally only
async fn test_update_fields_writes_only_requested_columns() {
    let db = TestDb::new().await.unwrap();
    let store = PgRepositoryStore::new(db.pool.clone());

    let original = Repository::new(&db.endpoints(&["a"]), Some(true));
    store.insert(&original).await.unwrap();

    let mut changed = original.clone();
    changed.endpoints.push(db.endpoint("b"));
    changed.is_fork = Some(false);
    let written = store
        .update_fields(&changed, &[RepositoryField::Endpoints], &original)
        .await
        .unwrap();
    assert!(written);

    let stored = store.find(original.id).await.unwrap().unwrap();
    assert_eq!(stored.endpoints, db.endpoints(&["a", "b"]));
    assert_eq!(stored.is_fork, Some(true));

    let missing = Repository::new(&db.endpoints(&["c"]), None);
    let result = store
        .update_fields(&missing, &[RepositoryField::Endpoints], &missing)
        .await;
    assert!(matches!(result, Err(archivist_common::Error::NotFound(_))));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL - run locally only
async fn test_update_fields_refuses_stale_copy() {
    let db = TestDb::new().await.unwrap();
    let store = PgRepositoryStore::new(db.pool.clone());

    let original = Repository::new(&db.endpoints(&["a"]), None);
    store.insert(&original).await.unwrap();

    let mut first = original.clone();
    first.endpoints.push(db.endpoint("x"));
    let mut second = original.clone();
    second.endpoints.push(db.endpoint("y"));

    assert!(store
        .update_fields(&first, &[RepositoryField::Endpoints], &original)
        .await
        .unwrap());
    assert!(!store
        .update_fields(&second, &[RepositoryField::Endpoints], &original)
        .await
        .unwrap());

    let stored = store.find(original.id).await.unwrap().unwrap();
    assert_eq!(stored.endpoints, db.endpoints(&["a", "x"]));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL - run locally only
async fn test_concurrent_resolvers_keep_every_alias() {
    let db = TestDb::new().await.unwrap();
    let store = PgRepositoryStore::new(db.pool.clone());
    let seeded = Repository::new(&db.endpoints(&["a"]), None);
    store.insert(&seeded).await.unwrap();

    let mut tasks = Vec::new();
    for alias in ["p", "q", "r", "s", "t", "u"] {
        let resolver = RepositoryResolver::new(Arc::new(store.clone()));
        let endpoints = db.endpoints(&["a", alias]);
        tasks.push(tokio::spawn(async move {
            resolver.resolve(&endpoints, None).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), seeded.id);
    }

    let stored = store.find(seeded.id).await.unwrap().unwrap();
    assert_eq!(
        set(&stored.endpoints),
        set(&db.endpoints(&["a", "p", "q", "r", "s", "t", "u"]))
    );

    db.cleanup().await.unwrap();
}
