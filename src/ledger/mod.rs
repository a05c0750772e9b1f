//! The concurrent grade ledger: one record per (student, subject, year),
//! scored entries per term, and a lock that freezes a finalized record.

pub mod journal;
pub mod store;
pub mod upsert;

pub use journal::{EvaluationEntry, EvaluationInput};
pub use store::{CreateOutcome, GradeRecord, RecordKey};
pub use upsert::{record_evaluation, CONFLICT_RETRY_BUDGET, MAX_SCORE};

/// The three grading periods (lapsos) of an academic year.
pub const TERMS: [i64; 3] = [1, 2, 3];
