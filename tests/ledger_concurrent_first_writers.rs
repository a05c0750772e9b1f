use gradeledgerd::db;
use gradeledgerd::directory;
use gradeledgerd::error::LedgerError;
use gradeledgerd::ledger::{self, EvaluationInput, RecordKey};
use std::path::PathBuf;
use std::thread;
use tempfile::TempDir;

const FIRST_WRITERS: usize = 50;

#[test]
fn n_concurrent_first_writers_leave_exactly_one_record() {
    let dir = TempDir::new().expect("tempdir");
    let workspace: PathBuf = dir.path().to_path_buf();

    // Seed the directory (and the schema) before the writers start.
    let conn = db::open_db(&workspace).expect("open db");
    let student = directory::add_student(&conn, "Blanco", "Ana").expect("add student");
    let subject = directory::add_subject(&conn, "Biologia").expect("add subject");
    let year = directory::add_school_year(&conn, "2025-2026").expect("add year");
    let key = RecordKey::new(student, subject, year);
    drop(conn);

    let handles: Vec<_> = (0..FIRST_WRITERS)
        .map(|i| {
            let workspace = workspace.clone();
            let key = key.clone();
            thread::spawn(move || -> Result<String, LedgerError> {
                // One connection per writer; the workspace file is the only
                // shared state.
                let mut conn = db::open_db(&workspace).expect("open db");
                let entries = vec![EvaluationInput {
                    description: format!("Examen del escritor {i}"),
                    score: 15.0,
                    weight: None,
                }];
                ledger::record_evaluation(&mut conn, &key, 1, &entries).map(|r| r.id)
            })
        })
        .collect();

    let mut ok_ids = Vec::new();
    let mut transient_failures = 0usize;
    for h in handles {
        match h.join().expect("writer thread must not panic") {
            Ok(id) => ok_ids.push(id),
            Err(LedgerError::TransientConflict) => transient_failures += 1,
            Err(other) => panic!("unexpected failure class: {other:?}"),
        }
    }

    assert_eq!(ok_ids.len() + transient_failures, FIRST_WRITERS);
    assert!(!ok_ids.is_empty(), "at least one writer must succeed");

    // Every successful writer resolved to the same surviving record.
    let surviving = &ok_ids[0];
    assert!(ok_ids.iter().all(|id| id == surviving));

    let conn = db::open_db(&workspace).expect("reopen db");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM grade_records", [], |r| r.get(0))
        .expect("count records");
    assert_eq!(count, 1, "exactly one record must survive the race");

    // The last committed replace fully owns the term: one entry, not fifty.
    let entry_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM evaluation_entries WHERE record_id = ? AND term = 1",
            [surviving],
            |r| r.get(0),
        )
        .expect("count entries");
    assert_eq!(entry_count, 1);
}
