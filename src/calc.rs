//! Aggregation over committed ledger state: term averages, definitive
//! grades, and the class summary matrix. Everything here is read-only and
//! recomputable; nothing participates in a write transaction.

use crate::error::LedgerError;
use crate::ledger::journal::{self, EvaluationEntry};
use crate::ledger::store::{self, RecordKey};
use crate::ledger::TERMS;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

/// Half-up integer rounding in the `Int(x + 0.5)` family: 10.5 rounds to 11,
/// 10.49 to 10.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Unweighted arithmetic mean of `score` over one term's entries. An empty
/// term yields 0: absent scores contribute zero, they are not excluded from
/// the definitive-grade denominator. The stored `weight` is deliberately
/// ignored here.
pub fn term_average(entries: &[EvaluationEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    entries.iter().map(|e| e.score).sum::<f64>() / entries.len() as f64
}

/// Final grade for one subject: mean of the three term averages (always
/// divided by 3, empty terms included), rounded half-up. Inputs are already
/// within 0..=20, so no clamping is needed.
pub fn definitive_grade(term_averages: [f64; 3]) -> i64 {
    round_half_up(term_averages.iter().sum::<f64>() / 3.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermDetail {
    pub term: i64,
    pub entries: Vec<EvaluationEntry>,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDetail {
    pub student_id: String,
    pub subject_id: String,
    pub year_id: String,
    pub record_id: Option<String>,
    pub is_locked: bool,
    pub terms: Vec<TermDetail>,
    pub definitive: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub student_id: String,
    /// One definitive grade per subject, aligned with `ClassSummary::subject_ids`.
    pub definitives: Vec<i64>,
    pub overall: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub year_id: String,
    /// Columns, sorted by ascending subject id for a stable layout.
    pub subject_ids: Vec<String>,
    pub rows: Vec<StudentRow>,
}

fn group_by_term(entries: Vec<EvaluationEntry>) -> HashMap<i64, Vec<EvaluationEntry>> {
    let mut by_term: HashMap<i64, Vec<EvaluationEntry>> = HashMap::new();
    for e in entries {
        by_term.entry(e.term).or_default().push(e);
    }
    by_term
}

fn term_averages_for_record(
    conn: &Connection,
    record_id: &str,
) -> Result<[f64; 3], LedgerError> {
    let by_term = group_by_term(journal::entries_for_record(conn, record_id)?);
    let mut averages = [0.0; 3];
    for (i, term) in TERMS.iter().enumerate() {
        averages[i] = by_term.get(term).map(|v| term_average(v)).unwrap_or(0.0);
    }
    Ok(averages)
}

/// Term-by-term breakdown plus definitive for one student/subject/year.
/// A missing record reads as three empty terms, definitive 0.
pub fn subject_detail(conn: &Connection, key: &RecordKey) -> Result<SubjectDetail, LedgerError> {
    let record = store::get_by_key(conn, key)?;
    let (record_id, is_locked, entries) = match &record {
        Some(r) => (
            Some(r.id.clone()),
            r.is_locked,
            journal::entries_for_record(conn, &r.id)?,
        ),
        None => (None, false, Vec::new()),
    };

    let mut by_term = group_by_term(entries);
    let mut terms = Vec::with_capacity(TERMS.len());
    let mut averages = [0.0; 3];
    for (i, term) in TERMS.iter().enumerate() {
        let term_entries = by_term.remove(term).unwrap_or_default();
        let average = term_average(&term_entries);
        averages[i] = average;
        terms.push(TermDetail {
            term: *term,
            entries: term_entries,
            average,
        });
    }

    Ok(SubjectDetail {
        student_id: key.student_id.clone(),
        subject_id: key.subject_id.clone(),
        year_id: key.year_id.clone(),
        record_id,
        is_locked,
        terms,
        definitive: definitive_grade(averages),
    })
}

/// Definitive grades for a set of students across a set of subjects in one
/// year, plus each student's overall average (mean of the per-subject
/// definitives, rounded half-up). Students with no record for a subject get
/// a definitive of 0 for that column, still counted in the overall mean.
pub fn class_summary(
    conn: &Connection,
    year_id: &str,
    student_ids: &[String],
    subject_ids: &[String],
) -> Result<ClassSummary, LedgerError> {
    let mut subjects: Vec<String> = subject_ids.to_vec();
    subjects.sort();
    subjects.dedup();

    let mut rows = Vec::with_capacity(student_ids.len());
    for student_id in student_ids {
        let mut definitives = Vec::with_capacity(subjects.len());
        for subject_id in &subjects {
            let key = RecordKey::new(student_id.clone(), subject_id.clone(), year_id);
            let definitive = match store::get_by_key(conn, &key)? {
                Some(r) => definitive_grade(term_averages_for_record(conn, &r.id)?),
                None => 0,
            };
            definitives.push(definitive);
        }
        let overall = if definitives.is_empty() {
            0
        } else {
            round_half_up(definitives.iter().sum::<i64>() as f64 / definitives.len() as f64)
        };
        rows.push(StudentRow {
            student_id: student_id.clone(),
            definitives,
            overall,
        });
    }

    Ok(ClassSummary {
        year_id: year_id.to_string(),
        subject_ids: subjects,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(term: i64, score: f64) -> EvaluationEntry {
        EvaluationEntry {
            id: format!("e-{term}-{score}"),
            record_id: "r".to_string(),
            term,
            description: "prueba".to_string(),
            score,
            weight: None,
        }
    }

    #[test]
    fn round_half_up_breaks_ties_upward() {
        assert_eq!(round_half_up(10.5), 11);
        assert_eq!(round_half_up(10.49), 10);
        assert_eq!(round_half_up(0.0), 0);
        assert_eq!(round_half_up(10.667), 11);
    }

    #[test]
    fn term_average_of_empty_term_is_zero() {
        assert_eq!(term_average(&[]), 0.0);
    }

    #[test]
    fn term_average_is_unweighted_mean() {
        let entries = vec![entry(1, 10.0), entry(1, 20.0)];
        assert_eq!(term_average(&entries), 15.0);

        // A heavy weight on one entry must not move the mean.
        let mut weighted = vec![entry(1, 10.0), entry(1, 20.0)];
        weighted[0].weight = Some(9.0);
        assert_eq!(term_average(&weighted), 15.0);
    }

    #[test]
    fn definitive_grade_divides_by_three_and_rounds_half_up() {
        assert_eq!(definitive_grade([10.0, 15.0, 20.0]), 15);
        // 32/3 = 10.667 rounds up to 11.
        assert_eq!(definitive_grade([10.0, 11.0, 11.0]), 11);
        // Empty terms stay in the denominator: (13 + 18 + 0) / 3 = 10.33.
        assert_eq!(definitive_grade([13.0, 18.0, 0.0]), 10);
    }
}
