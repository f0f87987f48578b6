use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

fn path_param(req: &Request, key: &str) -> Option<PathBuf> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Explicit `workspacePath`, else the selected workspace.
fn workspace_param(state: &AppState, req: &Request) -> Option<PathBuf> {
    path_param(req, "workspacePath").or_else(|| state.workspace.clone())
}

/// Paths naming the same directory, however spelled. Falls back to plain
/// comparison when either side does not exist yet.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// On failure the workspace is deselected so `health` never reports a
/// workspace without a connection.
fn reopen_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let res = open_workspace(state, path);
    if let Err(e) = &res {
        tracing::warn!(path = %path.display(), error = %e, "workspace reopen after import failed");
        state.workspace = None;
        state.db = None;
    }
    res
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = workspace_param(state, req) else {
        return err(&req.id, "bad_params", "missing workspacePath", None);
    };
    let Some(out_path) = path_param(req, "outPath") else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };

    match backup::export_workspace_bundle(&workspace, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "dbSha256": summary.db_sha256,
            }),
        ),
        Err(e) => err(&req.id, "backup_failed", format!("{e:#}"), None),
    }
}

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = workspace_param(state, req) else {
        return err(&req.id, "bad_params", "missing workspacePath", None);
    };
    let Some(in_path) = path_param(req, "inPath") else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };

    // The open connection must not outlive the file it points at.
    let current = state
        .workspace
        .clone()
        .filter(|open| same_directory(open, &workspace));
    if current.is_some() {
        state.db = None;
    }

    let result = backup::import_workspace_bundle(&in_path, &workspace);

    if let Some(open) = current {
        if let Err(reopen) = reopen_workspace(state, &open) {
            let (code, message) = match &result {
                Ok(_) => ("db_open_failed", format!("{reopen:?}")),
                Err(e) => ("backup_failed", format!("{e:#}")),
            };
            return err(
                &req.id,
                code,
                message,
                Some(json!({ "reopenError": format!("{reopen:#}") })),
            );
        }
    }

    let summary = match result {
        Ok(s) => s,
        Err(e) => return err(&req.id, "backup_failed", format!("{e:#}"), None),
    };

    ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "workspacePath": workspace.to_string_lossy(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_export(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_import(state, req)),
        _ => None,
    }
}
