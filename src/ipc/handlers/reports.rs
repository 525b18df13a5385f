use crate::calc::{self, ClassStatistics, ProcessedStudent, SubjectCatalog};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::grading::graded_cohort;
use crate::ipc::handlers::setup::load_settings;
use crate::ipc::helpers::required_i64;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn settings_or_err(state: &AppState, req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    load_settings(state.db.as_ref())
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))
}

fn subject_columns(catalog: &SubjectCatalog) -> serde_json::Value {
    json!(catalog
        .subjects
        .iter()
        .map(|s| json!({
            "name": s,
            "isCore": catalog.is_core(s),
            "facilitator": catalog.facilitator(s),
        }))
        .collect::<Vec<_>>())
}

fn master_sheet_rows(students: &[ProcessedStudent]) -> serde_json::Value {
    json!(students
        .iter()
        .map(|s| json!({
            "rank": s.rank,
            "id": s.id,
            "name": s.name,
            "cells": s
                .subjects
                .iter()
                .map(|g| json!({ "subject": g.subject, "score": g.score, "grade": g.grade }))
                .collect::<Vec<_>>(),
            "totalScore": s.total_score,
            "bestSixAggregate": s.best_six_aggregate,
            "category": s.category,
        }))
        .collect::<Vec<_>>())
}

fn handle_master_sheet_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let settings = match settings_or_err(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subjects = match state.dataset.as_ref() {
        Some(d) => subject_columns(&d.catalog),
        None => return err(&req.id, "no_dataset", "load a dataset first", None),
    };
    let (graded, _) = match graded_cohort(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    ok(
        &req.id,
        json!({
            "fingerprint": graded.fingerprint,
            "header": settings,
            "subjects": subjects,
            "rows": master_sheet_rows(&graded.students),
            "subjectStats": graded.statistics.subjects,
            "categoryCounts": calc::category_counts(&graded.students),
            "classAverageAggregate": calc::class_average_aggregate(&graded.students),
            "gradingKey": calc::grading_key(),
        }),
    )
}

/// Report card subject table: best-performing subject first, catalog order
/// among equal scores, each row carrying the class mean for comparison.
fn report_card_subjects(
    student: &ProcessedStudent,
    statistics: &ClassStatistics,
) -> serde_json::Value {
    let mut subjects: Vec<_> = student.subjects.iter().collect();
    subjects.sort_by(|a, b| b.score.cmp(&a.score));
    json!(subjects
        .iter()
        .map(|g| {
            let (mean, _) = statistics.mean_and_std_dev(&g.subject);
            json!({
                "subject": g.subject,
                "score": g.score,
                "grade": g.grade,
                "gradeValue": g.grade_value,
                "remark": g.remark,
                "facilitator": g.facilitator,
                "zScore": g.z_score,
                "classMean": mean,
            })
        })
        .collect::<Vec<_>>())
}

fn handle_report_card_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_i64(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let settings = match settings_or_err(state, req) {
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
            "header": settings,
            "student": {
                "id": student.id,
                "idLabel": format!("{:04}", student.id),
                "name": student.name,
                "rank": student.rank,
                "totalScore": student.total_score,
                "bestSixAggregate": student.best_six_aggregate,
                "category": student.category,
                "weakness": student.weakness,
                "overallRemark": student.overall_remark,
            },
            "subjects": report_card_subjects(student, &graded.statistics),
            "bestCoreSubjects": student.best_core_subjects,
            "bestElectiveSubjects": student.best_elective_subjects,
            "cohortSize": graded.students.len(),
            "classAverageAggregate": calc::class_average_aggregate(&graded.students),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.masterSheetModel" => Some(handle_master_sheet_model(state, req)),
        "reports.reportCardModel" => Some(handle_report_card_model(state, req)),
        _ => None,
    }
}
