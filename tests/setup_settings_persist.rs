mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn settings_defaults_without_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let setup = request_ok(&mut stdin, &mut reader, "1", "setup.get", json!({}));
    assert_eq!(
        setup.pointer("/school/schoolName").and_then(|v| v.as_str()),
        Some("UNITED BAYLOR ACADEMY")
    );
    assert_eq!(
        setup.pointer("/exam/attendanceTotal").and_then(|v| v.as_i64()),
        Some(60)
    );
    assert_eq!(
        setup.pointer("/exam/className").and_then(|v| v.as_str()),
        Some("Basic Nine (9)")
    );
    assert!(setup
        .pointer("/exam/reportDate")
        .and_then(|v| v.as_str())
        .map(|s| s.len() == 10)
        .unwrap_or(false));

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "setup.update",
        json!({ "section": "school", "patch": { "schoolName": "X" } }),
    );
    assert_eq!(error_code(&resp), Some("no_workspace"));
}

#[test]
fn settings_persist_across_sidecar_restarts() {
    let workspace = temp_dir("broadsheet-setup-persist");

    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let updated = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "setup.update",
            json!({
                "section": "school",
                "patch": { "schoolName": "  ST. MARY'S JHS ", "schoolEmail": "office@stmarys.edu.gh" }
            }),
        );
        assert_eq!(
            updated.pointer("/value/schoolName").and_then(|v| v.as_str()),
            Some("ST. MARY'S JHS")
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "setup.update",
            json!({
                "section": "exam",
                "patch": { "attendanceTotal": 72, "reportDate": "20-02-2025" }
            }),
        );
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(
        setup.pointer("/school/schoolName").and_then(|v| v.as_str()),
        Some("ST. MARY'S JHS")
    );
    assert_eq!(
        setup.pointer("/school/headTeacherName").and_then(|v| v.as_str()),
        Some("HEADMASTER NAME")
    );
    assert_eq!(
        setup.pointer("/exam/attendanceTotal").and_then(|v| v.as_i64()),
        Some(72)
    );
    assert_eq!(
        setup.pointer("/exam/reportDate").and_then(|v| v.as_str()),
        Some("20-02-2025")
    );
}

#[test]
fn settings_update_validation() {
    let workspace = temp_dir("broadsheet-setup-validate");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let cases = [
        json!({ "section": "zoom", "patch": {} }),
        json!({ "section": "school", "patch": "nope" }),
        json!({ "section": "school", "patch": { "motto": "Knowledge" } }),
        json!({ "section": "school", "patch": { "schoolEmail": "not-an-email" } }),
        json!({ "section": "exam", "patch": { "attendanceTotal": 401 } }),
        json!({ "section": "exam", "patch": { "attendanceTotal": "60" } }),
        json!({ "section": "exam", "patch": { "examTitle": "X".repeat(161) } }),
    ];
    for (i, params) in cases.iter().enumerate() {
        let id = format!("v{}", i);
        let resp = request(&mut stdin, &mut reader, &id, "setup.update", params.clone());
        assert_eq!(error_code(&resp), Some("bad_params"), "case {}", params);
    }

    // Rejected patches leave stored values untouched.
    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(
        setup.pointer("/exam/attendanceTotal").and_then(|v| v.as_i64()),
        Some(60)
    );
}

#[test]
fn workspace_restores_dataset_and_adopts_loaded_one() {
    let fresh = temp_dir("broadsheet-workspace-adopt");

    let fingerprint = {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let loaded = request_ok(&mut stdin, &mut reader, "1", "dataset.loadReference", json!({}));
        assert_eq!(loaded.get("persisted").and_then(|v| v.as_bool()), Some(false));
        let selected = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "workspace.select",
            json!({ "path": fresh.to_string_lossy() }),
        );
        assert_eq!(
            selected.get("datasetRestored").and_then(|v| v.as_bool()),
            Some(false)
        );
        assert_eq!(selected.get("studentCount").and_then(|v| v.as_i64()), Some(26));
        loaded
            .get("fingerprint")
            .and_then(|v| v.as_str())
            .expect("fingerprint")
            .to_string()
    };

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": fresh.to_string_lossy() }),
    );
    assert_eq!(
        selected.get("datasetRestored").and_then(|v| v.as_bool()),
        Some(true)
    );
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(
        health.get("datasetFingerprint").and_then(|v| v.as_str()),
        Some(fingerprint.as_str())
    );
}

#[test]
fn restored_dataset_keeps_its_fingerprint() {
    let workspace = temp_dir("broadsheet-workspace-fingerprint");

    let installed = {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let summary = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "dataset.set",
            json!({
                "catalog": {
                    "subjects": ["Maths"],
                    "coreSubjects": ["Maths", "Science"],
                    "facilitators": { "Art": "MADAM X" }
                },
                "students": [{ "id": 1, "name": "AMA", "scores": { "Maths": 64 } }]
            }),
        );
        assert_eq!(summary.get("coreSubjectCount").and_then(|v| v.as_i64()), Some(1));
        let ds = request_ok(&mut stdin, &mut reader, "3", "dataset.get", json!({}));
        assert_eq!(ds.pointer("/catalog/coreSubjects"), Some(&json!(["Maths"])));
        assert_eq!(ds.pointer("/catalog/facilitators"), Some(&json!({})));
        assert_eq!(summary.get("fingerprint"), ds.get("fingerprint"));
        ds
    };

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(
        selected.get("datasetRestored").and_then(|v| v.as_bool()),
        Some(true)
    );
    let restored = request_ok(&mut stdin, &mut reader, "2", "dataset.get", json!({}));
    assert_eq!(restored, installed);
}
