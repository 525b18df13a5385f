use crate::dataset::{Dataset, DatasetError};
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn current_dataset<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Dataset, serde_json::Value> {
    state
        .dataset
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_dataset", "load a dataset first", None))
}

pub fn dataset_err(req: &Request, e: DatasetError) -> serde_json::Value {
    err(&req.id, &e.code, e.message, None)
}
