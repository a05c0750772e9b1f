use crate::error::{from_sqlite, LedgerError};
use crate::ledger::journal::{self, EvaluationInput};
use crate::ledger::store::{self, CreateOutcome, GradeRecord, RecordKey};
use crate::ledger::TERMS;
use rusqlite::{Connection, TransactionBehavior};

/// How many times a single call re-runs its transaction when it loses a
/// creation race or hits a busy writer. Small and fixed so worst-case
/// latency stays bounded; exhaustion surfaces as `TransientConflict`.
pub const CONFLICT_RETRY_BUDGET: usize = 3;

/// Scores are on the 0..=20 scale.
pub const MAX_SCORE: f64 = 20.0;

/// Record the full entry set for one (student, subject, year, term).
///
/// The whole operation is one immediate-mode transaction: find the record,
/// create it if absent (re-fetching when another writer wins the race),
/// refuse if it is locked, then replace the term's entries and commit. An
/// empty entry list clears the term. Validation happens before any storage
/// access; the locked check happens inside the same transaction as the
/// write, so no window opens between check and act.
pub fn record_evaluation(
    conn: &mut Connection,
    key: &RecordKey,
    term: i64,
    entries: &[EvaluationInput],
) -> Result<GradeRecord, LedgerError> {
    validate(term, entries)?;

    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt(conn, key, term, entries) {
            Err(LedgerError::TransientConflict) if attempts < CONFLICT_RETRY_BUDGET => continue,
            other => return other,
        }
    }
}

fn validate(term: i64, entries: &[EvaluationInput]) -> Result<(), LedgerError> {
    if !TERMS.contains(&term) {
        return Err(LedgerError::Validation(format!(
            "term must be 1, 2 or 3 (got {term})"
        )));
    }
    for (i, e) in entries.iter().enumerate() {
        if e.description.trim().is_empty() {
            return Err(LedgerError::Validation(format!(
                "entry {i}: description must not be empty"
            )));
        }
        if !e.score.is_finite() || !(0.0..=MAX_SCORE).contains(&e.score) {
            return Err(LedgerError::Validation(format!(
                "entry {i}: score must be within 0..=20 (got {})",
                e.score
            )));
        }
        if let Some(w) = e.weight {
            if !w.is_finite() || w < 0.0 {
                return Err(LedgerError::Validation(format!(
                    "entry {i}: weight must be a non-negative number (got {w})"
                )));
            }
        }
    }
    Ok(())
}

fn attempt(
    conn: &mut Connection,
    key: &RecordKey,
    term: i64,
    entries: &[EvaluationInput],
) -> Result<GradeRecord, LedgerError> {
    // Immediate mode takes the write lock up front, so a check-then-write
    // pair never deadlocks on a lock upgrade against another writer.
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_sqlite)?;

    let record = match store::get_by_key(&tx, key)? {
        Some(r) => r,
        None => match store::create_if_absent(&tx, key)? {
            CreateOutcome::Created(r) => r,
            // Another writer created the record between our read and insert;
            // its row is the one that survives, so adopt it.
            CreateOutcome::AlreadyExists => {
                store::get_by_key(&tx, key)?.ok_or(LedgerError::TransientConflict)?
            }
        },
    };

    if record.is_locked {
        // Dropping the transaction rolls back; nothing was written.
        return Err(LedgerError::RecordLocked(record.id));
    }

    journal::replace_term(&tx, &record.id, term, entries)?;
    tx.commit().map_err(from_sqlite)?;
    Ok(record)
}
