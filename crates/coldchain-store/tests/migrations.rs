use coldchain_store::Store;
use tempfile::TempDir;

#[test]
fn migrations_apply_once() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store.migrate().expect("migrate again");

    let version: i64 = store
        .connection()
        .query_row("SELECT version FROM coldchain_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .expect("schema version");
    assert_eq!(version, 1);
    assert_eq!(store.schema_version().expect("schema version"), 1);
}

#[test]
fn open_creates_parent_dir_and_restricts_permissions() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("nested").join("coldchain.sqlite3");
    let store = Store::open(&path).expect("open");
    store.migrate().expect("migrate");
    assert!(path.exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
