use crate::calc::{RawStudentRecord, SubjectCatalog};
use crate::dataset::Dataset;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

pub const DB_FILE_NAME: &str = "broadsheet.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workspace_settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            name TEXT PRIMARY KEY,
            sort_order INTEGER NOT NULL,
            is_core INTEGER NOT NULL,
            facilitator TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            sort_order INTEGER PRIMARY KEY,
            id INTEGER NOT NULL,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS scores(
            student_row INTEGER NOT NULL,
            subject TEXT NOT NULL,
            score INTEGER NOT NULL,
            PRIMARY KEY(student_row, subject),
            FOREIGN KEY(student_row) REFERENCES students(sort_order)
        )",
        [],
    )?;

    // The catalog is stored even when the cohort is empty, so this flag tells
    // "never saved" apart from "saved with no students".
    conn.execute(
        "CREATE TABLE IF NOT EXISTS dataset_meta(
            id INTEGER PRIMARY KEY CHECK (id = 1),
            saved_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM workspace_settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO workspace_settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

/// Replaces the stored dataset in one transaction.
pub fn dataset_save(conn: &Connection, dataset: &Dataset) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM scores", [])?;
    tx.execute("DELETE FROM students", [])?;
    tx.execute("DELETE FROM subjects", [])?;

    {
        let mut subject_stmt = tx.prepare(
            "INSERT INTO subjects(name, sort_order, is_core, facilitator) VALUES(?, ?, ?, ?)",
        )?;
        for (i, subject) in dataset.catalog.subjects.iter().enumerate() {
            subject_stmt.execute((
                subject,
                i as i64,
                dataset.catalog.is_core(subject) as i64,
                dataset.catalog.facilitators.get(subject),
            ))?;
        }

        let mut student_stmt =
            tx.prepare("INSERT INTO students(sort_order, id, name) VALUES(?, ?, ?)")?;
        let mut score_stmt =
            tx.prepare("INSERT INTO scores(student_row, subject, score) VALUES(?, ?, ?)")?;
        for (i, student) in dataset.students.iter().enumerate() {
            student_stmt.execute((i as i64, student.id, &student.name))?;
            for (subject, score) in &student.scores {
                score_stmt.execute((i as i64, subject, score))?;
            }
        }
    }

    tx.execute(
        "INSERT INTO dataset_meta(id, saved_at) VALUES(1, ?)
         ON CONFLICT(id) DO UPDATE SET saved_at = excluded.saved_at",
        [chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn dataset_load(conn: &Connection) -> anyhow::Result<Option<Dataset>> {
    let saved: Option<String> = conn
        .query_row("SELECT saved_at FROM dataset_meta WHERE id = 1", [], |r| {
            r.get(0)
        })
        .optional()?;
    if saved.is_none() {
        return Ok(None);
    }

    let mut catalog = SubjectCatalog::default();
    let mut subject_stmt =
        conn.prepare("SELECT name, is_core, facilitator FROM subjects ORDER BY sort_order")?;
    let rows = subject_stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)? != 0,
                r.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (name, is_core, facilitator) in rows {
        if is_core {
            catalog.core_subjects.insert(name.clone());
        }
        if let Some(f) = facilitator {
            catalog.facilitators.insert(name.clone(), f);
        }
        catalog.subjects.push(name);
    }

    let mut scores_by_row: BTreeMap<i64, BTreeMap<String, i64>> = BTreeMap::new();
    let mut score_stmt = conn.prepare("SELECT student_row, subject, score FROM scores")?;
    let score_rows = score_stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (row, subject, score) in score_rows {
        scores_by_row
            .entry(row)
            .or_default()
            .insert(subject, score);
    }

    // Ids are not required to be unique, so rows are keyed by cohort position.
    let mut student_stmt =
        conn.prepare("SELECT sort_order, id, name FROM students ORDER BY sort_order")?;
    let students = student_stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(row, id, name)| RawStudentRecord {
            id,
            name,
            scores: scores_by_row.remove(&row).unwrap_or_default(),
        })
        .collect();

    Ok(Some(Dataset { catalog, students }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::reference_dataset;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        init_schema(&conn).expect("init schema");
        conn
    }

    #[test]
    fn dataset_round_trips_in_catalog_and_cohort_order() {
        let conn = memory_db();
        assert!(dataset_load(&conn).expect("load").is_none());

        let ds = reference_dataset();
        dataset_save(&conn, &ds).expect("save");
        let loaded = dataset_load(&conn).expect("load").expect("dataset");
        assert_eq!(loaded, ds);
        assert_eq!(loaded.fingerprint(), ds.fingerprint());
    }

    #[test]
    fn saving_replaces_previous_dataset() {
        let conn = memory_db();
        dataset_save(&conn, &reference_dataset()).expect("save reference");

        let small = Dataset {
            catalog: SubjectCatalog {
                subjects: vec!["Maths".to_string()],
                ..SubjectCatalog::default()
            },
            students: Vec::new(),
        };
        dataset_save(&conn, &small).expect("save small");
        let loaded = dataset_load(&conn).expect("load").expect("dataset");
        assert_eq!(loaded, small);
    }

    #[test]
    fn duplicate_student_ids_are_kept_apart() {
        let conn = memory_db();
        let mut ds = reference_dataset();
        ds.students[1].id = ds.students[0].id;
        dataset_save(&conn, &ds).expect("save");
        let loaded = dataset_load(&conn).expect("load").expect("dataset");
        assert_eq!(loaded.students[0].scores, ds.students[0].scores);
        assert_eq!(loaded.students[1].scores, ds.students[1].scores);
        assert_eq!(loaded, ds);
    }

    #[test]
    fn listed_catalog_round_trips_with_same_fingerprint() {
        let conn = memory_db();
        let mut ds = Dataset {
            catalog: SubjectCatalog {
                subjects: vec!["Maths".to_string()],
                core_subjects: ["Maths", "Science"].iter().map(|s| s.to_string()).collect(),
                facilitators: [("Art".to_string(), "MADAM X".to_string())]
                    .into_iter()
                    .collect(),
            },
            students: vec![RawStudentRecord {
                id: 1,
                name: "AMA".to_string(),
                scores: [("Maths".to_string(), 64)].into_iter().collect(),
            }],
        };
        // Entries for unlisted subjects have no row to live in.
        dataset_save(&conn, &ds).expect("save");
        let lossy = dataset_load(&conn).expect("load").expect("dataset");
        assert_ne!(lossy.fingerprint(), ds.fingerprint());

        assert!(ds.catalog.retain_listed());
        dataset_save(&conn, &ds).expect("save listed");
        let loaded = dataset_load(&conn).expect("load").expect("dataset");
        assert_eq!(loaded, ds);
        assert_eq!(loaded.fingerprint(), ds.fingerprint());
    }

    #[test]
    fn settings_upsert_overwrites() {
        let conn = memory_db();
        assert!(settings_get_json(&conn, "setup.school").expect("get").is_none());
        settings_set_json(&conn, "setup.school", &serde_json::json!({ "a": 1 })).expect("set");
        settings_set_json(&conn, "setup.school", &serde_json::json!({ "a": 2 })).expect("set");
        assert_eq!(
            settings_get_json(&conn, "setup.school").expect("get"),
            Some(serde_json::json!({ "a": 2 }))
        );
    }
}
