use proposal_core::db::migrations::{latest_version, schema_version};
use proposal_core::db::{open_db, DbError};
use proposal_core::{
    KeyValueBackend, MemoryStore, PersistenceGateway, SqliteStore, StorageError, WriteBatch,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Draft {
    title: String,
    pages: u32,
}

fn sample() -> Draft {
    Draft {
        title: "Volume II".to_string(),
        pages: 42,
    }
}

#[test]
fn memory_gateway_set_get_remove_clear() {
    let gateway = PersistenceGateway::new(MemoryStore::new());

    assert!(gateway.set("draft", &sample()));
    assert!(gateway.set("seen", &true));
    assert_eq!(gateway.get("draft", Draft { title: String::new(), pages: 0 }), sample());

    assert!(gateway.remove("draft"));
    assert_eq!(gateway.get("draft", Option::<Draft>::None), None);

    assert!(gateway.clear());
    assert!(!gateway.contains("seen"));
    assert!(gateway.backend().is_empty());
}

#[test]
fn get_returns_default_for_missing_key() {
    let gateway = PersistenceGateway::new(MemoryStore::new());
    assert_eq!(gateway.get("missing", vec![1, 2, 3]), vec![1, 2, 3]);
}

#[test]
fn quota_failure_is_reported_as_false_not_error() {
    let gateway = PersistenceGateway::new(MemoryStore::with_quota(24));

    assert!(gateway.set("a", &"short"));
    assert!(!gateway.set("b", &"x".repeat(64)));
    assert!(!gateway.contains("b"));
    assert_eq!(gateway.get("a", String::new()), "short");
}

#[test]
fn backend_surfaces_quota_as_typed_error() {
    let store = MemoryStore::with_quota(4);
    let err = store.write("key", "value").unwrap_err();
    assert!(matches!(
        err,
        StorageError::QuotaExceeded { quota: 4, .. }
    ));
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proposals.db");

    {
        let gateway = PersistenceGateway::new(SqliteStore::open(&path).unwrap());
        assert!(gateway.set("draft", &sample()));
        assert!(gateway.set("draft", &Draft { pages: 43, ..sample() }));
    }

    let gateway = PersistenceGateway::new(SqliteStore::open(&path).unwrap());
    let loaded: Option<Draft> = gateway.try_get("draft").unwrap();
    assert_eq!(loaded.map(|draft| draft.pages), Some(43));

    assert!(gateway.remove("draft"));
    assert!(!gateway.contains("draft"));
}

#[test]
fn sqlite_store_clear_removes_everything() {
    let gateway = PersistenceGateway::new(SqliteStore::open_in_memory().unwrap());
    assert!(gateway.set("one", &1));
    assert!(gateway.set("two", &2));
    assert!(gateway.clear());
    assert_eq!(gateway.get("one", 0), 0);
    assert_eq!(gateway.get("two", 0), 0);
}

#[test]
fn commit_writes_every_key_or_none() {
    let gateway = PersistenceGateway::new(MemoryStore::with_quota(40));
    assert!(gateway.set("proposals", &"[]"));
    assert!(gateway.set("calendar_events", &"[]"));

    let oversized = WriteBatch::new()
        .set("proposals", &"p".repeat(8))
        .set("calendar_events", &"e".repeat(32));
    assert!(!gateway.commit(oversized));
    assert_eq!(gateway.get("proposals", String::new()), "[]");
    assert_eq!(gateway.get("calendar_events", String::new()), "[]");

    let fits = WriteBatch::new()
        .set("proposals", &"p")
        .set("calendar_events", &"e");
    assert!(gateway.commit(fits));
    assert_eq!(gateway.get("proposals", String::new()), "p");
    assert_eq!(gateway.get("calendar_events", String::new()), "e");
}

#[test]
fn sqlite_commit_lands_in_one_transaction() {
    let gateway = PersistenceGateway::new(SqliteStore::open_in_memory().unwrap());
    let batch = WriteBatch::new()
        .set("draft", &sample())
        .set("seen", &true)
        .set("draft", &Draft { pages: 7, ..sample() });
    assert!(gateway.commit(batch));

    assert_eq!(gateway.get("draft", sample()).pages, 7);
    assert!(gateway.get("seen", false));
}

#[test]
fn sqlite_file_is_stamped_and_keeps_one_row_per_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.db");

    {
        let gateway = PersistenceGateway::new(SqliteStore::open(&path).unwrap());
        assert!(gateway.set("draft", &sample()));
        assert!(gateway.set("draft", &Draft { pages: 50, ..sample() }));
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let (rows, stamped): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), MIN(updated_at) FROM kv_entries WHERE key = 'draft';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(rows, 1);
    assert!(stamped > 0);
}

#[test]
fn store_refuses_database_from_newer_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    {
        let gateway = PersistenceGateway::new(SqliteStore::open(&path).unwrap());
        assert!(gateway.set("draft", &sample()));
    }

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", latest_version() + 1)
        .unwrap();
    drop(conn);

    match SqliteStore::open(&path) {
        Err(StorageError::Db(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        })) => {
            assert_eq!(db_version, latest_version() + 1);
            assert_eq!(latest_supported, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema was accepted"),
    }
}
