use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn key_param(req: &Request) -> Result<String, serde_json::Value> {
    match req.params.get("key").and_then(|v| v.as_str()) {
        Some(k) if !k.trim().is_empty() => Ok(k.trim().to_string()),
        _ => Err(err(&req.id, "bad_params", "missing key", None)),
    }
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let key = match key_param(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    match db::settings_get_json(conn, &key) {
        Ok(value) => ok(&req.id, json!({ "key": key, "value": value })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_settings_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let key = match key_param(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let value = req
        .params
        .get("value")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    if key == db::SETTING_BELOW_FLOOR_CODE && !(value.is_null() || value.is_string()) {
        return err(
            &req.id,
            "bad_params",
            format!("{} must be a string or null", key),
            None,
        );
    }

    match db::settings_set_json(conn, &key, &value) {
        Ok(()) => {
            tracing::info!(key = %key, "setting updated");
            ok(&req.id, json!({ "key": key }))
        }
        Err(e) => err(&req.id, "db_insert_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.set" => Some(handle_settings_set(state, req)),
        _ => None,
    }
}
