use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ledger::{self, EvaluationInput, RecordKey};
use serde_json::json;

fn parse_key(params: &serde_json::Value) -> Result<RecordKey, &'static str> {
    let student_id = params
        .get("studentId")
        .and_then(|v| v.as_str())
        .ok_or("missing studentId")?;
    let subject_id = params
        .get("subjectId")
        .and_then(|v| v.as_str())
        .ok_or("missing subjectId")?;
    let year_id = params
        .get("yearId")
        .and_then(|v| v.as_str())
        .ok_or("missing yearId")?;
    Ok(RecordKey::new(student_id, subject_id, year_id))
}

fn handle_record_evaluation(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let key = match parse_key(&req.params) {
        Ok(k) => k,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let term = match req.params.get("term").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing/invalid term", None),
    };
    let Some(entries_raw) = req.params.get("entries") else {
        return err(&req.id, "bad_params", "missing entries[]", None);
    };
    let entries: Vec<EvaluationInput> = match serde_json::from_value(entries_raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("entries[] is malformed: {e}"),
                None,
            )
        }
    };

    match ledger::record_evaluation(conn, &key, term, &entries) {
        Ok(record) => ok(
            &req.id,
            json!({
                "recordId": record.id,
                "isLocked": record.is_locked,
                "entryCount": entries.len()
            }),
        ),
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_set_locked(state: &mut AppState, req: &Request, locked: bool) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let key = match parse_key(&req.params) {
        Ok(k) => k,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let record = match ledger::store::get_by_key(conn, &key) {
        Ok(Some(r)) => r,
        Ok(None) => return err(&req.id, "not_found", "grade record not found", None),
        Err(e) => return err(&req.id, e.code(), e.to_string(), None),
    };

    let result = if locked {
        ledger::store::lock(conn, &record.id)
    } else {
        ledger::store::unlock(conn, &record.id)
    };
    match result {
        Ok(()) => ok(
            &req.id,
            json!({ "recordId": record.id, "isLocked": locked }),
        ),
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ledger.recordEvaluation" => Some(handle_record_evaluation(state, req)),
        "ledger.lock" => Some(handle_set_locked(state, req, true)),
        "ledger.unlock" => Some(handle_set_locked(state, req, false)),
        _ => None,
    }
}
