use coursekit::core::config::{self, Config};
use coursekit::core::db;
use coursekit::core::error::CoursekitError;
use coursekit::core::guard;
use coursekit::core::schemas;
use coursekit::core::store::{DocKey, DocRead, DocumentStore, FsDocumentStore, to_document};
use coursekit::core::validate::{SLUG_PATTERN, Validator};
use rusqlite::params;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn guard_rejects_traversal_in_every_form() {
    for bad in ["", "..", "../x", "x/..", "..\\x", "a/b", "/abs", "nul\0byte", "."] {
        assert!(guard::validate_component(bad).is_err(), "{:?} should be rejected", bad);
    }
    for good in ["demo", "001-intro", "my course", "quiz.json"] {
        assert!(guard::validate_component(good).is_ok(), "{:?} should pass", good);
    }
}

#[test]
fn store_round_trip_and_corruption_signal() {
    let tmp = tempdir().expect("tempdir");
    let store = FsDocumentStore::new(tmp.path());
    let dir = DocKey::new(["demo"]).expect("key");
    let key = dir.join("doc.json").expect("join");

    assert!(matches!(store.read(&key), DocRead::Missing));

    store.create_dir(&dir).expect("create_dir");
    let doc = to_document(&json!({"a": 1, "nested": {"b": [1, 2]}})).expect("doc");
    store.write(&key, &doc).expect("write");
    assert!(store.exists(&key));
    match store.read(&key) {
        DocRead::Found(read) => assert_eq!(read, doc),
        other => panic!("unexpected read: {:?}", other),
    }

    fs::write(store.path_for(&key).expect("path"), "{oops").expect("corrupt");
    let read = store.read(&key);
    assert!(read.is_corrupt());
    assert!(read.into_document().is_empty());

    assert_eq!(store.list_dirs(&DocKey::root()).expect("list"), ["demo"]);
    store.delete_dir(&dir).expect("delete_dir");
    assert!(!store.exists(&dir));
}

#[test]
fn progress_db_connection_pragmas() {
    let tmp = tempdir().expect("tempdir");
    db::initialize_progress_db(tmp.path()).expect("init");

    let conn = db::db_connect(&db::progress_db_path(tmp.path())).expect("connect");
    let fk_on: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .expect("pragma foreign_keys");
    assert_eq!(fk_on, 1);
    let journal: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("pragma journal_mode");
    assert_eq!(journal.to_lowercase(), "wal");

    conn.execute(
        "INSERT INTO course_user (user_id, course_slug, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        params!["alice", "demo", "1Z"],
    )
    .expect("insert");
    let dup = conn.execute(
        "INSERT INTO course_user (user_id, course_slug, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        params!["alice", "demo", "2Z"],
    );
    assert!(dup.is_err(), "(user_id, course_slug) must be unique");
}

#[test]
fn config_file_loads_with_defaults_for_missing_sections() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(config::DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        r#"
        [server]
        bind = "0.0.0.0:9090"

        [[auth.tokens]]
        token = "secret"
        user = "alice"
        "#,
    )
    .expect("write config");

    let loaded = config::load_config(Some(&path)).expect("load");
    assert_eq!(loaded.server.bind, "0.0.0.0:9090");
    assert_eq!(loaded.storage.data_dir, PathBuf::from("storage"));
    assert_eq!(loaded.log.level, "info");
    assert_eq!(
        loaded.courses_dir(),
        PathBuf::from("storage").join(schemas::COURSES_DIR)
    );
    assert_eq!(loaded.token_map().get("secret").map(String::as_str), Some("alice"));
    assert_ne!(loaded, Config::default());
}

#[test]
fn config_missing_explicit_file_is_error() {
    let tmp = tempdir().expect("tempdir");
    let err = config::load_config(Some(&tmp.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, CoursekitError::ConfigError(_)));
}

#[test]
fn validator_collects_dotted_errors() {
    let body = json!({"items": [{"id": "ok"}, {"id": "-bad"}]});
    let mut v = Validator::new();
    for (idx, item) in body["items"].as_array().expect("items").iter().enumerate() {
        let field = format!("items.{}.id", idx);
        if let Some(id) = v.required_string(&field, item.get("id"), Some(255), None) {
            v.matches(&field, &id, &SLUG_PATTERN, None);
        }
    }
    let CoursekitError::ValidationError(errors) = v.finish().unwrap_err() else {
        panic!("expected validation error");
    };
    assert_eq!(errors.fields().collect::<Vec<_>>(), ["items.1.id"]);
    assert_eq!(
        errors.get("items.1.id").expect("message"),
        ["The items.1.id field format is invalid."]
    );
}
