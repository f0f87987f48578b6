use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::grades::GradePolicy;

pub const DB_FILE_NAME: &str = "students.sqlite3";
pub const SETTING_BELOW_FLOOR_CODE: &str = "grades.belowFloorCode";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;
    tracing::info!(path = %db_path.display(), "opened workspace database");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            department INTEGER NOT NULL,
            year INTEGER NOT NULL,
            course_a INTEGER NOT NULL,
            course_b INTEGER NOT NULL,
            course_c INTEGER NOT NULL,
            created_at TEXT
        )",
        [],
    )?;
    // Databases written before created_at existed only carry the seven form columns.
    ensure_students_created_at(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn ensure_students_created_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "created_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN created_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    if value.is_null() {
        conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
        return Ok(());
    }
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

/// Grading policy stored in the workspace. Missing or non-string values mean "no floor code".
pub fn grade_policy(conn: &Connection) -> anyhow::Result<GradePolicy> {
    let below_floor_code = settings_get_json(conn, SETTING_BELOW_FLOOR_CODE)?
        .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());
    Ok(GradePolicy { below_floor_code })
}
