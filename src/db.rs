use crate::schema::MIGRATIONS;
use crate::TriageError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[cfg(unix)]
fn ensure_secure_permissions(db_path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(dir) = db_path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        std::fs::create_dir_all(dir)?;
        // Only set permissions on dirs we created
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    }
    if db_path.exists() {
        std::fs::set_permissions(db_path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_secure_permissions(db_path: &Path) -> std::io::Result<()> {
    if let Some(dir) = db_path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

pub fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".triage").join("complaints.db")
}

/// Apply standard PRAGMAs (before migrations).
fn apply_pragmas(conn: &Connection, readonly: bool) -> Result<(), TriageError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    if !readonly {
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
    }
    Ok(())
}

pub fn open_db_readonly(db_path: &Path) -> Result<Connection, TriageError> {
    if !db_path.exists() {
        return Err(TriageError::Config(format!(
            "database not found: {}",
            db_path.display()
        )));
    }

    let conn = Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    apply_pragmas(&conn, true)?;
    Ok(conn)
}

pub fn open_db(db_path: &Path) -> Result<Connection, TriageError> {
    ensure_secure_permissions(db_path)?;

    let mut conn = Connection::open(db_path)?;
    apply_pragmas(&conn, false)?;
    MIGRATIONS.to_latest(&mut conn)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(db_path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(conn)
}

/// In-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection, TriageError> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    MIGRATIONS.to_latest(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_dir_and_schema() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("complaints.db");
        let conn = open_db(&db_path).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM complaints", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
        assert!(db_path.exists());
    }

    #[test]
    fn readonly_requires_existing_db() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = open_db_readonly(&dir.path().join("missing.db")).unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("complaints.db");
        drop(open_db(&db_path).unwrap());
        drop(open_db(&db_path).unwrap());
        let conn = open_db_readonly(&db_path).unwrap();
        conn.query_row("SELECT COUNT(*) FROM complaints", [], |r| r.get::<_, i64>(0))
            .unwrap();
    }
}
