use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

#[derive(Clone, Copy)]
enum SetupSection {
    School,
    Exam,
}

impl SetupSection {
    const ALL: [SetupSection; 2] = [SetupSection::School, SetupSection::Exam];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "school" => Some(Self::School),
            "exam" => Some(Self::Exam),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Exam => "exam",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::School => "setup.school",
            Self::Exam => "setup.exam",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::School => json!({
            "schoolName": "UNITED BAYLOR ACADEMY",
            "schoolContact": "",
            "schoolEmail": "",
            "headTeacherName": "HEADMASTER NAME"
        }),
        SetupSection::Exam => json!({
            "examTitle": "2ND MOCK 2025 BROAD SHEET EXAMINATION",
            "termInfo": "TERM 2",
            "academicYear": "2024/2025",
            "className": "Basic Nine (9)",
            "nextTermBegin": "TBA",
            "attendanceTotal": 60,
            "startDate": "10-02-2025",
            "endDate": "15-02-2025",
            "reportDate": chrono::Local::now().format("%d-%m-%Y").to_string()
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.chars().count() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::School => match k.as_str() {
                "schoolName" | "headTeacherName" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 120)?));
                }
                "schoolContact" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 60)?));
                }
                "schoolEmail" => {
                    let s = parse_string_max(v, k, 200)?;
                    if !s.is_empty() && !s.contains('@') {
                        return Err("schoolEmail must be an email address".into());
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                _ => return Err(format!("unknown school field: {}", k)),
            },
            SetupSection::Exam => match k.as_str() {
                "examTitle" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 160)?));
                }
                "termInfo" | "academicYear" | "className" | "nextTermBegin" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 60)?));
                }
                "startDate" | "endDate" | "reportDate" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 32)?));
                }
                "attendanceTotal" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 400)?));
                }
                _ => return Err(format!("unknown exam field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed historical values fall back to defaults.
            if let Err(msg) = merge_section_patch(section, &mut current, saved_obj) {
                warn!(section = section.name(), error = %msg, "ignoring stored settings");
                current = default_section(section);
            }
        }
    }
    Ok(current)
}

/// All sections keyed by section name. Defaults only when no workspace is open.
pub fn load_settings(conn: Option<&Connection>) -> anyhow::Result<Value> {
    let mut out = Map::new();
    for section in SetupSection::ALL {
        let value = match conn {
            Some(conn) => load_section(conn, section)?,
            None => default_section(section),
        };
        out.insert(section.name().to_string(), value);
    }
    Ok(Value::Object(out))
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match load_settings(state.db.as_ref()) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(
            &req.id,
            "bad_params",
            "unknown section",
            Some(json!({ "section": section_raw })),
        );
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    info!(section = section.name(), fields = patch_obj.len(), "settings saved");
    ok(&req.id, json!({ "section": section.name(), "value": current }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
