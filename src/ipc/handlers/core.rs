use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "datasetLoaded": state.dataset.is_some(),
            "datasetFingerprint": state.dataset.as_ref().map(|d| d.fingerprint()),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let conn = match db::open_db(&path) {
        Ok(conn) => conn,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };

    // A stored dataset wins; otherwise whatever is already loaded moves into
    // the new workspace.
    let stored = match db::dataset_load(&conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let dataset_restored = stored.is_some();
    if let Some(dataset) = stored {
        info!(
            students = dataset.students.len(),
            subjects = dataset.catalog.subjects.len(),
            "restored dataset from workspace"
        );
        state.dataset = Some(dataset);
        state.graded = None;
    } else if let Some(dataset) = state.dataset.as_ref() {
        if let Err(e) = db::dataset_save(&conn, dataset) {
            warn!(error = %e, "failed to copy loaded dataset into workspace");
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }

    info!(path = %path.to_string_lossy(), "workspace opened");
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "datasetRestored": dataset_restored,
            "studentCount": state.dataset.as_ref().map(|d| d.students.len()).unwrap_or(0),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
