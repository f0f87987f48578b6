use rusqlite::{Connection, Row};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CodeTable;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("student {0} already exists")]
    Duplicate(i64),
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
}

/// Validated input for a new row. Construct through `NewStudent::from_params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub id: i64,
    pub name: String,
    pub department: i64,
    pub year: i64,
    pub courses: [i64; 3],
}

impl NewStudent {
    pub fn from_params(params: &serde_json::Value) -> Result<Self, String> {
        let id = required_int(params, "id")?;
        if id < 1 {
            return Err("id must be a positive integer".into());
        }
        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(v) => v.trim().to_string(),
            None => return Err("missing name".into()),
        };
        if name.is_empty() {
            return Err("name must not be empty".into());
        }
        let department = coded(params, "department", CodeTable::Department)?;
        let year = coded(params, "year", CodeTable::Year)?;
        let course_a = coded(params, "courseA", CodeTable::Course)?;
        let course_b = coded(params, "courseB", CodeTable::Course)?;
        let course_c = coded(params, "courseC", CodeTable::Course)?;

        Ok(NewStudent {
            id,
            name,
            department,
            year,
            courses: [course_a, course_b, course_c],
        })
    }
}

pub fn required_int(params: &serde_json::Value, key: &str) -> Result<i64, String> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Err(format!("missing {}", key)),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| format!("{} must be an integer", key)),
    }
}

fn coded(params: &serde_json::Value, key: &str, table: CodeTable) -> Result<i64, String> {
    let code = required_int(params, key)?;
    if !table.contains(code) {
        return Err(format!(
            "{} must be between 0 and {}",
            key,
            table.labels().len() - 1
        ));
    }
    Ok(code)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: i64,
    pub name: String,
    pub department: i64,
    pub department_label: Option<String>,
    pub year: i64,
    pub year_label: Option<String>,
    pub course_a: i64,
    pub course_a_label: Option<String>,
    pub course_b: i64,
    pub course_b_label: Option<String>,
    pub course_c: i64,
    pub course_c_label: Option<String>,
    pub created_at: Option<String>,
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, department, year, course_a, course_b, course_c, created_at FROM students";

fn row_to_student(row: &Row<'_>) -> rusqlite::Result<StudentRow> {
    let department: i64 = row.get(2)?;
    let year: i64 = row.get(3)?;
    let course_a: i64 = row.get(4)?;
    let course_b: i64 = row.get(5)?;
    let course_c: i64 = row.get(6)?;
    let label = |t: CodeTable, c: i64| t.label(c).map(|s| s.to_string());
    Ok(StudentRow {
        id: row.get(0)?,
        name: row.get(1)?,
        department,
        department_label: label(CodeTable::Department, department),
        year,
        year_label: label(CodeTable::Year, year),
        course_a,
        course_a_label: label(CodeTable::Course, course_a),
        course_b,
        course_b_label: label(CodeTable::Course, course_b),
        course_c,
        course_c_label: label(CodeTable::Course, course_c),
        created_at: row.get(7)?,
    })
}

pub fn add_student(conn: &Connection, s: &NewStudent) -> Result<(), StoreError> {
    let [course_a, course_b, course_c] = s.courses;
    let res = conn.execute(
        "INSERT INTO students(
           id,
           name,
           department,
           year,
           course_a,
           course_b,
           course_c,
           created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (
            s.id,
            &s.name,
            s.department,
            s.year,
            course_a,
            course_b,
            course_c,
        ),
    );
    match res {
        Ok(_) => {
            tracing::info!(student_id = s.id, "student added");
            Ok(())
        }
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::Duplicate(s.id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Zero or one row; the id is the primary key.
pub fn search_student(conn: &Connection, id: i64) -> Result<Vec<StudentRow>, StoreError> {
    let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([id], row_to_student)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_students(conn: &Connection) -> Result<Vec<StudentRow>, StoreError> {
    let sql = format!("{} ORDER BY id", SELECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], row_to_student)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Returns whether a row was removed. A missing id is not an error.
pub fn delete_record(conn: &Connection, id: i64) -> Result<bool, StoreError> {
    let n = conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    if n > 0 {
        tracing::info!(student_id = id, "student deleted");
    }
    Ok(n > 0)
}
