use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::calc::{ClassStatistics, ProcessedStudent};
use crate::dataset::Dataset;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Result of one grading run, valid for the dataset whose fingerprint it carries.
#[derive(Debug, Clone)]
pub struct GradedCohort {
    pub fingerprint: String,
    pub statistics: ClassStatistics,
    pub students: Vec<ProcessedStudent>,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub dataset: Option<Dataset>,
    pub graded: Option<GradedCohort>,
}
