use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::ledger::RecordKey;

fn string_list(params: &serde_json::Value, name: &str) -> Option<Vec<String>> {
    params.get(name).and_then(|v| v.as_array()).map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    })
}

fn handle_subject_detail(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };
    let subject_id = match req.params.get("subjectId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing subjectId", None),
    };
    let year_id = match req.params.get("yearId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing yearId", None),
    };

    let key = RecordKey::new(student_id, subject_id, year_id);
    match calc::subject_detail(conn, &key) {
        Ok(detail) => match serde_json::to_value(detail) {
            Ok(v) => ok(&req.id, v),
            Err(e) => err(&req.id, "internal", e.to_string(), None),
        },
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_class_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let year_id = match req.params.get("yearId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing yearId", None),
    };
    let Some(student_ids) = string_list(&req.params, "studentIds") else {
        return err(&req.id, "bad_params", "missing studentIds[]", None);
    };
    let Some(subject_ids) = string_list(&req.params, "subjectIds") else {
        return err(&req.id, "bad_params", "missing subjectIds[]", None);
    };

    match calc::class_summary(conn, year_id, &student_ids, &subject_ids) {
        Ok(summary) => match serde_json::to_value(summary) {
            Ok(v) => ok(&req.id, v),
            Err(e) => err(&req.id, "internal", e.to_string(), None),
        },
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.subjectDetail" => Some(handle_subject_detail(state, req)),
        "reports.classSummary" => Some(handle_class_summary(state, req)),
        _ => None,
    }
}
