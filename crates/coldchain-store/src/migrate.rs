use crate::error::{Result, StoreError};
use rusqlite::{Connection, OptionalExtension};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "001_init.sql",
    sql: include_str!("../migrations/001_init.sql"),
}];

/// Applies every migration newer than the recorded schema version inside one
/// transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS coldchain_schema (version INTEGER NOT NULL);")?;
    let current = match read_version(&tx)? {
        Some(version) => version,
        None => {
            tx.execute("INSERT INTO coldchain_schema (version) VALUES (0);", [])?;
            0
        }
    };

    let latest = MIGRATIONS.last().map_or(0, |m| m.version);
    if current > latest {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than this build supports ({latest})"
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql).map_err(|err| {
            StoreError::Migration(format!("{} failed: {err}", migration.name))
        })?;
        let updated = tx.execute(
            "UPDATE coldchain_schema SET version = ?1;",
            [migration.version],
        )?;
        if updated != 1 {
            return Err(StoreError::Migration(format!(
                "expected a single schema row, updated {updated}"
            )));
        }
    }

    tx.commit()?;
    Ok(())
}

/// Recorded schema version; 0 before the first migration.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'coldchain_schema';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(0);
    }
    Ok(read_version(conn)?.unwrap_or(0))
}

fn read_version(conn: &Connection) -> Result<Option<i64>> {
    let version = conn
        .query_row("SELECT version FROM coldchain_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{run_migrations, schema_version, MIGRATIONS};
    use crate::error::StoreErrorKind;
    use rusqlite::Connection;

    #[test]
    fn versions_are_sequential() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, index as i64 + 1, "{}", migration.name);
        }
    }

    #[test]
    fn fresh_database_reports_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len() as i64);
    }

    #[test]
    fn newer_database_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("UPDATE coldchain_schema SET version = 99;", [])
            .unwrap();
        let err = run_migrations(&conn).unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Migration);
    }
}
