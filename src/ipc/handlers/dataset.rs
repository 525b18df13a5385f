use crate::calc::SubjectCatalog;
use crate::dataset::{self, Dataset};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{current_dataset, dataset_err, required_str};
use crate::ipc::types::{AppState, Request};
use crate::reference::reference_dataset;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

/// Makes `dataset` the active one, persisting it first when a workspace is
/// open. Core and facilitator entries for unlisted subjects are dropped so the
/// stored copy fingerprints the same. Any previous grading result is dropped.
fn install_dataset(
    state: &mut AppState,
    req: &Request,
    mut dataset: Dataset,
    source: &str,
) -> Result<serde_json::Value, serde_json::Value> {
    if dataset.catalog.retain_listed() {
        warn!(source, "dropped catalog entries for unlisted subjects");
    }
    if let Some(conn) = state.db.as_ref() {
        db::dataset_save(conn, &dataset)
            .map_err(|e| err(&req.id, "db_update_failed", e.to_string(), None))?;
    }

    let fingerprint = dataset.fingerprint();
    info!(
        source,
        students = dataset.students.len(),
        subjects = dataset.catalog.subjects.len(),
        fingerprint = %fingerprint,
        "dataset loaded"
    );
    let summary = json!({
        "fingerprint": fingerprint,
        "subjectCount": dataset.catalog.subjects.len(),
        "coreSubjectCount": dataset.catalog.core_subjects.len(),
        "studentCount": dataset.students.len(),
        "persisted": state.db.is_some(),
    });
    state.dataset = Some(dataset);
    state.graded = None;
    Ok(summary)
}

fn respond(req: &Request, result: Result<serde_json::Value, serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e,
    }
}

fn handle_load_reference(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = install_dataset(state, req, reference_dataset(), "reference");
    respond(req, result)
}

fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let dataset: Dataset = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let result = install_dataset(state, req, dataset, "inline");
    respond(req, result)
}

fn handle_import_json(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let dataset = match dataset::read_dataset_json(&path) {
        Ok(v) => v,
        Err(e) => return dataset_err(req, e),
    };
    let result = install_dataset(state, req, dataset, "json");
    respond(req, result)
}

fn handle_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    // Explicit catalog first, then the active one; with neither the CSV
    // header defines the subjects.
    let catalog: Option<SubjectCatalog> = match req.params.get("catalog") {
        Some(v) if !v.is_null() => match serde_json::from_value(v.clone()) {
            Ok(c) => Some(c),
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("catalog: {}", e),
                    None,
                )
            }
        },
        _ => state.dataset.as_ref().map(|d| d.catalog.clone()),
    };

    let import = match dataset::read_cohort_csv(&path, catalog) {
        Ok(v) => v,
        Err(e) => return dataset_err(req, e),
    };
    let ignored = import.ignored_columns;
    match install_dataset(state, req, import.dataset, "csv") {
        Ok(mut summary) => {
            summary["ignoredColumns"] = json!(ignored);
            ok(&req.id, summary)
        }
        Err(e) => e,
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let dataset = match current_dataset(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "fingerprint": dataset.fingerprint(),
            "catalog": dataset.catalog,
            "students": dataset.students,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dataset.loadReference" => Some(handle_load_reference(state, req)),
        "dataset.set" => Some(handle_set(state, req)),
        "dataset.importJson" => Some(handle_import_json(state, req)),
        "dataset.importCsv" => Some(handle_import_csv(state, req)),
        "dataset.get" => Some(handle_get(state, req)),
        _ => None,
    }
}
