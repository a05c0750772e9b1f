use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open (and bootstrap) the workspace database.
///
/// Every caller gets its own connection; there is no shared handle. The
/// workspace file is the only coordination point, so concurrent writers rely
/// on WAL plus the busy timeout to serialize instead of failing fast.
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("gradeledger.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
    conn.busy_timeout(Duration::from_millis(5000))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS school_years(
            id TEXT PRIMARY KEY,
            label TEXT NOT NULL
        )",
        [],
    )?;

    // The UNIQUE key triple is the backstop against duplicate-record races;
    // the coordinator's create-then-refetch logic depends on it.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grade_records(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            year_id TEXT NOT NULL,
            is_locked INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE(student_id, subject_id, year_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            FOREIGN KEY(year_id) REFERENCES school_years(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grade_records_student ON grade_records(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grade_records_year ON grade_records(year_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS evaluation_entries(
            id TEXT PRIMARY KEY,
            record_id TEXT NOT NULL,
            term INTEGER NOT NULL,
            description TEXT NOT NULL,
            score REAL NOT NULL,
            weight REAL,
            FOREIGN KEY(record_id) REFERENCES grade_records(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_evaluation_entries_record_term
         ON evaluation_entries(record_id, term)",
        [],
    )?;

    Ok(conn)
}
