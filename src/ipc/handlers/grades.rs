use crate::db;
use crate::grades::{self, GradeError, GradePolicy};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn current_policy(state: &AppState) -> anyhow::Result<GradePolicy> {
    match state.db.as_ref() {
        Some(conn) => db::grade_policy(conn),
        None => Ok(GradePolicy::default()),
    }
}

fn error_obj(e: &GradeError) -> serde_json::Value {
    json!({ "code": e.code(), "message": e.to_string() })
}

fn handle_grades_evaluate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("score") else {
        return err(&req.id, "bad_params", "missing score", None);
    };
    let policy = match current_policy(state) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    match grades::evaluate_json(raw, &policy) {
        Ok(grade) => ok(&req.id, json!({ "grade": grade })),
        Err(e) => err(&req.id, e.code(), e.to_string(), Some(json!({ "score": raw }))),
    }
}

fn handle_grades_evaluate_many(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(scores) = req.params.get("scores").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing scores array", None);
    };
    let policy = match current_policy(state) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let results: Vec<serde_json::Value> = scores
        .iter()
        .map(|raw| match grades::evaluate_json(raw, &policy) {
            Ok(grade) => json!({ "grade": grade }),
            Err(e) => json!({ "error": error_obj(&e) }),
        })
        .collect();
    ok(&req.id, json!({ "results": results }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.evaluate" => Some(handle_grades_evaluate(state, req)),
        "grades.evaluateMany" => Some(handle_grades_evaluate_many(state, req)),
        _ => None,
    }
}
