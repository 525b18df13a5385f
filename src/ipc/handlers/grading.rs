use crate::calc;
use crate::dataset::Dataset;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_i64;
use crate::ipc::types::{AppState, GradedCohort, Request};
use serde_json::json;
use std::time::Instant;
use tracing::debug;

pub fn grade_dataset(dataset: &Dataset, fingerprint: String) -> GradedCohort {
    let statistics = calc::compute_class_statistics(&dataset.students, &dataset.catalog);
    let students = calc::process_students(&dataset.students, &statistics, &dataset.catalog);
    GradedCohort {
        fingerprint,
        statistics,
        students,
    }
}

/// Grading result for the active dataset, recomputed only when the dataset
/// fingerprint moved. The flag reports whether the cached result was reused.
pub fn graded_cohort<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<(&'a GradedCohort, bool), serde_json::Value> {
    let Some(dataset) = state.dataset.as_ref() else {
        return Err(err(&req.id, "no_dataset", "load a dataset first", None));
    };
    let fingerprint = dataset.fingerprint();

    let (graded, cached) = match state.graded.take() {
        Some(g) if g.fingerprint == fingerprint => (g, true),
        _ => {
            let started = Instant::now();
            let g = grade_dataset(dataset, fingerprint);
            debug!(
                students = g.students.len(),
                elapsed = ?started.elapsed(),
                "graded cohort"
            );
            (g, false)
        }
    };
    let graded: &'a GradedCohort = state.graded.insert(graded);
    Ok((graded, cached))
}

fn handle_stats_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (graded, _) = match graded_cohort(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "fingerprint": graded.fingerprint,
            "statistics": graded.statistics,
        }),
    )
}

fn handle_process(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (graded, cached) = match graded_cohort(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "fingerprint": graded.fingerprint,
            "cached": cached,
            "statistics": graded.statistics,
            "students": graded.students,
        }),
    )
}

fn handle_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_i64(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (graded, _) = match graded_cohort(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(student) = graded.students.iter().find(|s| s.id == student_id) else {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        );
    };
    ok(
        &req.id,
        json!({
            "fingerprint": graded.fingerprint,
            "student": student,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.compute" => Some(handle_stats_compute(state, req)),
        "grading.process" => Some(handle_process(state, req)),
        "grading.student" => Some(handle_student(state, req)),
        _ => None,
    }
}
