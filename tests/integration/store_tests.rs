use hashkeeper::scanner::{Hasher, HashedFile};
use hashkeeper::store::{HashRecord, HashStore, PathFilter, StoreError};
use std::fs;
use std::time::SystemTime;
use tempfile::TempDir;

fn record(path: &str, byte: u8) -> HashRecord {
    let hashed = HashedFile {
        hash: [byte; 32],
        size: u64::from(byte),
        created: SystemTime::UNIX_EPOCH,
        modified: SystemTime::now(),
    };
    HashRecord::from_hashed(path, &hashed, 2)
}

#[test]
fn test_records_survive_checkpoint_and_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("h.sqlite");
    let mut store = HashStore::open(&db).unwrap();
    let original = record("/data/a.txt", 1);
    store.insert(&original).unwrap();
    store.checkpoint().unwrap();
    store.close().unwrap();

    let reopened = HashStore::open(&db).unwrap();
    let loaded = reopened.get("/data/a.txt").unwrap().unwrap();
    assert_eq!(loaded.content_hash, original.content_hash);
    assert_eq!(loaded.size_bytes, 1);
    assert_eq!(loaded.session_id, 2);
    assert_eq!(loaded.modified_at, original.modified_at);
}

#[test]
fn test_uncheckpointed_changes_are_not_durable() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("h.sqlite");
    let store = HashStore::open(&db).unwrap();
    store.insert(&record("/data/a.txt", 1)).unwrap();
    store.close().unwrap();

    assert!(HashStore::open(&db).unwrap().is_empty().unwrap());
}

#[test]
fn test_garbage_file_is_invalid_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("not-a-db.sqlite");
    fs::write(&db, vec![0x42u8; 4096]).unwrap();

    let err = HashStore::open(&db).unwrap_err();
    assert!(err.is_invalid_database());
}

#[test]
fn test_foreign_table_layout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("other.sqlite");
    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch("CREATE TABLE hashes (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
    }

    let err = HashStore::open(&db).unwrap_err();
    assert!(matches!(err, StoreError::InvalidSchema { .. }));
    assert!(err.is_invalid_database());
}

#[test]
fn test_legacy_rows_with_nulls_load() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("legacy.sqlite");
    let digest = "ab".repeat(32);
    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE hashes (id INTEGER PRIMARY KEY, filename TEXT NOT NULL, sha256 TEXT NOT NULL,
             filesize INTEGER, creation_date TEXT, modified_date TEXT, timestamp TEXT, session INTEGER)",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO hashes (filename, sha256) VALUES (?1, ?2)",
            rusqlite::params!["/old/file", digest],
        )
        .unwrap();
    }

    let store = HashStore::open(&db).unwrap();
    let loaded = store.get("/old/file").unwrap().unwrap();
    assert_eq!(loaded.content_hash, digest);
    assert_eq!(loaded.size_bytes, 0);
}

#[test]
fn test_filter_does_not_match_sibling_prefix() {
    let dir = TempDir::new().unwrap();
    let store = HashStore::open(&dir.path().join("h.sqlite")).unwrap();
    let sep = std::path::MAIN_SEPARATOR;
    let inside = format!("{sep}data{sep}a.txt");
    let sibling = format!("{sep}database{sep}b.txt");
    store.insert(&record(&inside, 1)).unwrap();
    store.insert(&record(&sibling, 2)).unwrap();

    let filter = PathFilter::Beneath(format!("{sep}data"));
    assert_eq!(store.query_paths(&filter).unwrap(), vec![inside]);
}

#[test]
fn test_filter_treats_wildcards_literally() {
    let dir = TempDir::new().unwrap();
    let store = HashStore::open(&dir.path().join("h.sqlite")).unwrap();
    let sep = std::path::MAIN_SEPARATOR;
    store.insert(&record(&format!("{sep}a_b{sep}x"), 1)).unwrap();
    store.insert(&record(&format!("{sep}axb{sep}y"), 2)).unwrap();

    let paths = store
        .query_paths(&PathFilter::Beneath(format!("{sep}a_b")))
        .unwrap();
    assert_eq!(paths.len(), 1);
}

#[test]
fn test_insert_duplicate_and_update_missing() {
    let dir = TempDir::new().unwrap();
    let store = HashStore::open(&dir.path().join("h.sqlite")).unwrap();
    store.insert(&record("/x", 1)).unwrap();

    assert!(matches!(
        store.insert(&record("/x", 2)).unwrap_err(),
        StoreError::AlreadyExists(_)
    ));
    assert!(matches!(
        store.update(&record("/y", 2)).unwrap_err(),
        StoreError::NotFound(_)
    ));
}

#[test]
fn test_stored_digest_matches_hasher() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("f.txt");
    fs::write(&file, b"abc").unwrap();
    let hashed = Hasher::new().hash_file(&file, None).unwrap();
    let store = HashStore::open(&dir.path().join("h.sqlite")).unwrap();

    store
        .insert(&HashRecord::from_hashed("/f.txt", &hashed, 1))
        .unwrap();

    assert_eq!(
        store.get("/f.txt").unwrap().unwrap().content_hash,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
