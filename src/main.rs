mod calc;
mod dataset;
mod db;
mod ipc;
mod reference;

use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries responses; logs go to stderr.
    let filter = EnvFilter::try_from_env("BROADSHEETD_LOG")
        .unwrap_or_else(|_| EnvFilter::new("broadsheetd=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    init_tracing();

    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "rejected request line");
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let method = req.method.clone();
        let started = Instant::now();
        let resp = ipc::handle_request(&mut state, req);
        debug!(
            method = %method,
            ok = resp.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            elapsed = ?started.elapsed(),
            "handled request"
        );
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
