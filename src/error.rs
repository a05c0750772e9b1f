use rusqlite::ffi;
use thiserror::Error;

/// Failure taxonomy for ledger operations. Each variant maps to a stable
/// IPC error code so callers can branch without parsing messages.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input (bad term, out-of-range score, empty description) or a
    /// dangling student/subject/year reference surfaced by the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The record is finalized; nothing was written. Never auto-retried.
    #[error("grade record {0} is locked")]
    RecordLocked(String),

    /// A uniqueness race or serialization failure that did not settle within
    /// the retry budget. Safe for the caller to retry later.
    #[error("write conflict did not settle within the retry budget")]
    TransientConflict,

    /// The underlying store failed for a reason that is not a conflict.
    /// Propagated immediately; backoff is the caller's policy.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] rusqlite::Error),
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "bad_params",
            LedgerError::RecordLocked(_) => "record_locked",
            LedgerError::TransientConflict => "transient_conflict",
            LedgerError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

/// Classify a raw SQLite failure into the ledger taxonomy.
///
/// Busy/locked means another writer holds the database; that is a transient
/// conflict, not an outage. A foreign-key violation means the directory ids
/// the caller handed us do not exist, which we report as a validation
/// failure. Everything else is treated as the store being unavailable.
pub(crate) fn from_sqlite(e: rusqlite::Error) -> LedgerError {
    if let rusqlite::Error::SqliteFailure(f, _) = &e {
        match f.code {
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                return LedgerError::TransientConflict;
            }
            rusqlite::ErrorCode::ConstraintViolation
                if f.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                return LedgerError::Validation(
                    "unknown student/subject/year reference".to_string(),
                );
            }
            _ => {}
        }
    }
    LedgerError::StorageUnavailable(e)
}
