use crate::calc::{RawStudentRecord, SubjectCatalog};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Catalog plus cohort: the unit that is loaded, stored and graded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub catalog: SubjectCatalog,
    #[serde(default)]
    pub students: Vec<RawStudentRecord>,
}

impl Dataset {
    /// Hex SHA-256 of the canonical JSON encoding. Every container in the
    /// dataset is ordered, so equal datasets always hash the same.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(&bytes))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetError {
    pub code: String,
    pub message: String,
}

impl DatasetError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvImport {
    pub dataset: Dataset,
    pub ignored_columns: Vec<String>,
}

pub fn parse_dataset_json(text: &str) -> Result<Dataset, DatasetError> {
    serde_json::from_str(text).map_err(|e| DatasetError::new("parse_failed", e.to_string()))
}

pub fn read_dataset_json(path: &Path) -> Result<Dataset, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DatasetError::new(
            "io_failed",
            format!("failed to read {}: {}", path.to_string_lossy(), e),
        )
    })?;
    parse_dataset_json(&text)
}

/// Header row is `id,name,<subject>...`. A blank cell leaves that subject
/// unscored. With no catalog the header subjects become an all-elective
/// catalog in column order.
pub fn parse_cohort_csv(
    text: &str,
    catalog: Option<SubjectCatalog>,
) -> Result<CsvImport, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DatasetError::new("parse_failed", e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let id_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("id"))
        .ok_or_else(|| DatasetError::new("parse_failed", "missing id column"))?;
    let name_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("name"))
        .ok_or_else(|| DatasetError::new("parse_failed", "missing name column"))?;
    let subject_cols: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_col && *i != name_col)
        .collect();

    let catalog = catalog.unwrap_or_else(|| SubjectCatalog {
        subjects: subject_cols.iter().map(|(_, h)| (*h).clone()).collect(),
        ..SubjectCatalog::default()
    });
    let ignored_columns: Vec<String> = subject_cols
        .iter()
        .filter(|(_, h)| !catalog.subjects.contains(*h))
        .map(|(_, h)| (*h).clone())
        .collect();

    let mut students = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_idx + 2;
        let record = record.map_err(|e| DatasetError::new("parse_failed", e.to_string()))?;
        let id_raw = record.get(id_col).unwrap_or("");
        let id: i64 = id_raw.parse().map_err(|_| {
            DatasetError::new(
                "parse_failed",
                format!("line {}: id must be an integer, got {:?}", line, id_raw),
            )
        })?;
        let name = record.get(name_col).unwrap_or("").to_string();

        let mut scores = BTreeMap::new();
        for (col, subject) in &subject_cols {
            if !catalog.subjects.contains(*subject) {
                continue;
            }
            let cell = record.get(*col).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let score: i64 = cell.parse().map_err(|_| {
                DatasetError::new(
                    "parse_failed",
                    format!(
                        "line {}: score for {} must be an integer, got {:?}",
                        line, subject, cell
                    ),
                )
            })?;
            scores.insert((*subject).clone(), score);
        }
        students.push(RawStudentRecord { id, name, scores });
    }

    Ok(CsvImport {
        dataset: Dataset { catalog, students },
        ignored_columns,
    })
}

pub fn read_cohort_csv(
    path: &Path,
    catalog: Option<SubjectCatalog>,
) -> Result<CsvImport, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DatasetError::new(
            "io_failed",
            format!("failed to read {}: {}", path.to_string_lossy(), e),
        )
    })?;
    parse_cohort_csv(&text, catalog)
}
