use gradeledgerd::calc;
use gradeledgerd::db;
use gradeledgerd::directory;
use gradeledgerd::error::LedgerError;
use gradeledgerd::ledger::{self, journal, EvaluationInput, RecordKey};
use rusqlite::Connection;
use tempfile::TempDir;

fn setup() -> (TempDir, Connection, RecordKey) {
    let dir = TempDir::new().expect("tempdir");
    let conn = db::open_db(dir.path()).expect("open db");
    let student = directory::add_student(&conn, "Paz", "Maria").expect("add student");
    let subject = directory::add_subject(&conn, "Matematica").expect("add subject");
    let year = directory::add_school_year(&conn, "2025-2026").expect("add year");
    (dir, conn, RecordKey::new(student, subject, year))
}

fn input(description: &str, score: f64) -> EvaluationInput {
    EvaluationInput {
        description: description.to_string(),
        score,
        weight: None,
    }
}

fn record_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM grade_records", [], |r| r.get(0))
        .expect("count records")
}

#[test]
fn first_write_creates_record_and_stores_entries_exactly() {
    let (_dir, mut conn, key) = setup();

    let entries = vec![input("Examen parcial", 12.0), input("Taller", 14.0)];
    let record = ledger::record_evaluation(&mut conn, &key, 1, &entries).expect("record term 1");
    assert!(!record.is_locked);
    assert_eq!(record_count(&conn), 1);

    let stored = journal::entries_for_term(&conn, &record.id, 1).expect("read term 1");
    let got: Vec<(String, f64)> = stored
        .iter()
        .map(|e| (e.description.clone(), e.score))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Examen parcial".to_string(), 12.0),
            ("Taller".to_string(), 14.0)
        ]
    );
}

#[test]
fn rewriting_a_term_replaces_instead_of_merging() {
    let (_dir, mut conn, key) = setup();

    let record = ledger::record_evaluation(&mut conn, &key, 1, &[input("Prueba 1", 10.0)])
        .expect("first write");
    ledger::record_evaluation(&mut conn, &key, 1, &[input("Prueba corregida", 16.0)])
        .expect("second write");

    let stored = journal::entries_for_term(&conn, &record.id, 1).expect("read term 1");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].description, "Prueba corregida");
    assert_eq!(stored[0].score, 16.0);
    // Still one record for the key.
    assert_eq!(record_count(&conn), 1);
}

#[test]
fn replacing_one_term_leaves_other_terms_untouched() {
    let (_dir, mut conn, key) = setup();

    let record = ledger::record_evaluation(&mut conn, &key, 1, &[input("Examen", 12.0)])
        .expect("write term 1");
    ledger::record_evaluation(&mut conn, &key, 2, &[input("Exposicion", 18.0)])
        .expect("write term 2");

    let term1_before = journal::entries_for_term(&conn, &record.id, 1).expect("term 1 before");
    ledger::record_evaluation(&mut conn, &key, 2, &[input("Exposicion final", 19.0)])
        .expect("rewrite term 2");
    let term1_after = journal::entries_for_term(&conn, &record.id, 1).expect("term 1 after");

    let snapshot = |entries: &[journal::EvaluationEntry]| -> Vec<(String, String, f64)> {
        entries
            .iter()
            .map(|e| (e.id.clone(), e.description.clone(), e.score))
            .collect()
    };
    assert_eq!(snapshot(&term1_before), snapshot(&term1_after));
}

#[test]
fn empty_entry_list_clears_the_term() {
    let (_dir, mut conn, key) = setup();

    let record = ledger::record_evaluation(&mut conn, &key, 3, &[input("Proyecto", 15.0)])
        .expect("write term 3");
    ledger::record_evaluation(&mut conn, &key, 3, &[]).expect("clear term 3");

    let stored = journal::entries_for_term(&conn, &record.id, 3).expect("read term 3");
    assert!(stored.is_empty());
}

#[test]
fn validation_rejects_before_touching_storage() {
    let (_dir, mut conn, key) = setup();

    let bad_calls: Vec<(i64, Vec<EvaluationInput>)> = vec![
        (4, vec![input("Examen", 10.0)]),
        (0, vec![input("Examen", 10.0)]),
        (1, vec![input("Examen", 20.5)]),
        (1, vec![input("Examen", -0.5)]),
        (1, vec![input("Examen", f64::NAN)]),
        (1, vec![input("   ", 10.0)]),
        (
            1,
            vec![EvaluationInput {
                description: "Examen".to_string(),
                score: 10.0,
                weight: Some(-1.0),
            }],
        ),
    ];

    for (term, entries) in bad_calls {
        let err = ledger::record_evaluation(&mut conn, &key, term, &entries)
            .expect_err("must be rejected");
        assert!(
            matches!(err, LedgerError::Validation(_)),
            "expected validation error, got {err:?}"
        );
    }

    // Rejected calls never created the record.
    assert_eq!(record_count(&conn), 0);
}

#[test]
fn dangling_directory_reference_reads_as_validation_failure() {
    let (_dir, mut conn, key) = setup();

    let bogus = RecordKey::new("no-such-student", key.subject_id.clone(), key.year_id.clone());
    let err = ledger::record_evaluation(&mut conn, &bogus, 1, &[input("Examen", 10.0)])
        .expect_err("dangling student id must fail");
    assert!(
        matches!(err, LedgerError::Validation(_)),
        "expected validation error, got {err:?}"
    );
    assert_eq!(record_count(&conn), 0);
}

#[test]
fn end_to_end_definitive_grade_matches_hand_computation() {
    let (_dir, mut conn, key) = setup();

    // Term 1: (12 + 14) / 2 = 13. Term 2: 18. Term 3 never written: 0.
    ledger::record_evaluation(
        &mut conn,
        &key,
        1,
        &[input("Examen parcial", 12.0), input("Taller", 14.0)],
    )
    .expect("term 1");
    ledger::record_evaluation(&mut conn, &key, 2, &[input("Exposicion", 18.0)]).expect("term 2");

    let detail = calc::subject_detail(&conn, &key).expect("detail");
    assert_eq!(detail.terms.len(), 3);
    assert_eq!(detail.terms[0].average, 13.0);
    assert_eq!(detail.terms[1].average, 18.0);
    assert_eq!(detail.terms[2].average, 0.0);
    // (13 + 18 + 0) / 3 = 10.33 rounds to 10.
    assert_eq!(detail.definitive, 10);
}
