use crate::error::{from_sqlite, LedgerError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scored item as supplied by the caller. `weight` is recorded with the
/// entry but the averaging formula does not consume it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationInput {
    pub description: String,
    pub score: f64,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationEntry {
    pub id: String,
    pub record_id: String,
    pub term: i64,
    pub description: String,
    pub score: f64,
    pub weight: Option<f64>,
}

/// Replace the full entry set for (record, term): delete everything for the
/// term, then insert the supplied entries. Runs on the caller's open
/// transaction and never commits on its own, so a mid-operation failure
/// leaves the prior term state intact. Entries for other terms are untouched.
pub fn replace_term(
    conn: &Connection,
    record_id: &str,
    term: i64,
    entries: &[EvaluationInput],
) -> Result<(), LedgerError> {
    conn.execute(
        "DELETE FROM evaluation_entries WHERE record_id = ? AND term = ?",
        (record_id, term),
    )
    .map_err(from_sqlite)?;

    let mut stmt = conn
        .prepare(
            "INSERT INTO evaluation_entries(id, record_id, term, description, score, weight)
             VALUES(?, ?, ?, ?, ?, ?)",
        )
        .map_err(from_sqlite)?;
    for e in entries {
        stmt.execute((
            Uuid::new_v4().to_string(),
            record_id,
            term,
            &e.description,
            e.score,
            e.weight,
        ))
        .map_err(from_sqlite)?;
    }
    Ok(())
}

pub fn entries_for_record(
    conn: &Connection,
    record_id: &str,
) -> Result<Vec<EvaluationEntry>, LedgerError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, record_id, term, description, score, weight
             FROM evaluation_entries
             WHERE record_id = ?
             ORDER BY term, rowid",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([record_id], |r| {
            Ok(EvaluationEntry {
                id: r.get(0)?,
                record_id: r.get(1)?,
                term: r.get(2)?,
                description: r.get(3)?,
                score: r.get(4)?,
                weight: r.get(5)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(from_sqlite)?;
    Ok(rows)
}

pub fn entries_for_term(
    conn: &Connection,
    record_id: &str,
    term: i64,
) -> Result<Vec<EvaluationEntry>, LedgerError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, record_id, term, description, score, weight
             FROM evaluation_entries
             WHERE record_id = ? AND term = ?
             ORDER BY rowid",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map((record_id, term), |r| {
            Ok(EvaluationEntry {
                id: r.get(0)?,
                record_id: r.get(1)?,
                term: r.get(2)?,
                description: r.get(3)?,
                score: r.get(4)?,
                weight: r.get(5)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(from_sqlite)?;
    Ok(rows)
}
