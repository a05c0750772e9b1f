use crate::error::{from_sqlite, LedgerError};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

/// The unique key of a ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub student_id: String,
    pub subject_id: String,
    pub year_id: String,
}

impl RecordKey {
    pub fn new(
        student_id: impl Into<String>,
        subject_id: impl Into<String>,
        year_id: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            subject_id: subject_id.into(),
            year_id: year_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    pub year_id: String,
    pub is_locked: bool,
    pub created_at: String,
}

/// Result of a creation attempt. `AlreadyExists` is not an error: it is the
/// signal that another writer won the race and the caller should re-fetch.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(GradeRecord),
    AlreadyExists,
}

pub fn get_by_key(conn: &Connection, key: &RecordKey) -> Result<Option<GradeRecord>, LedgerError> {
    conn.query_row(
        "SELECT id, student_id, subject_id, year_id, is_locked, created_at
         FROM grade_records
         WHERE student_id = ? AND subject_id = ? AND year_id = ?",
        (&key.student_id, &key.subject_id, &key.year_id),
        |r| {
            Ok(GradeRecord {
                id: r.get(0)?,
                student_id: r.get(1)?,
                subject_id: r.get(2)?,
                year_id: r.get(3)?,
                is_locked: r.get::<_, i64>(4)? != 0,
                created_at: r.get(5)?,
            })
        },
    )
    .optional()
    .map_err(from_sqlite)
}

/// Insert a fresh unlocked record unless one already exists for the key.
/// The UNIQUE(student_id, subject_id, year_id) constraint makes the losing
/// insert a no-op rather than a duplicate row.
pub fn create_if_absent(conn: &Connection, key: &RecordKey) -> Result<CreateOutcome, LedgerError> {
    let record = GradeRecord {
        id: Uuid::new_v4().to_string(),
        student_id: key.student_id.clone(),
        subject_id: key.subject_id.clone(),
        year_id: key.year_id.clone(),
        is_locked: false,
        created_at: Utc::now().to_rfc3339(),
    };
    let inserted = conn
        .execute(
            "INSERT INTO grade_records(id, student_id, subject_id, year_id, is_locked, created_at)
             VALUES(?, ?, ?, ?, 0, ?)
             ON CONFLICT(student_id, subject_id, year_id) DO NOTHING",
            (
                &record.id,
                &record.student_id,
                &record.subject_id,
                &record.year_id,
                &record.created_at,
            ),
        )
        .map_err(from_sqlite)?;
    if inserted == 0 {
        Ok(CreateOutcome::AlreadyExists)
    } else {
        Ok(CreateOutcome::Created(record))
    }
}

/// Finalize a record. Idempotent; locking a locked record is a no-op.
pub fn lock(conn: &Connection, record_id: &str) -> Result<(), LedgerError> {
    conn.execute(
        "UPDATE grade_records SET is_locked = 1 WHERE id = ?",
        [record_id],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

/// Administrative override to reopen a finalized record.
pub fn unlock(conn: &Connection, record_id: &str) -> Result<(), LedgerError> {
    conn.execute(
        "UPDATE grade_records SET is_locked = 0 WHERE id = ?",
        [record_id],
    )
    .map_err(from_sqlite)?;
    Ok(())
}
