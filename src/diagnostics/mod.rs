//! Diagnostic log for trainboard.
//!
//! Every caught failure (transport errors, malformed payloads, rejected form
//! values) and every push-channel lifecycle change is appended as one JSON
//! line to `~/.trainboard/diagnostics.jsonl`. Writing is best-effort: a
//! failure to log never interrupts the session.
//!
//! [`install_panic_hook`] records uncaught panics in the same file before the
//! default hook prints them.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::settings::{self, Settings};

static ENABLED: AtomicBool = AtomicBool::new(true);

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// One line of `diagnostics.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub timestamp: String,
    pub severity: Severity,
    /// Component that reported the entry (`editor`, `feed`, `logs`, ...).
    pub source: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Apply the `[logging]` settings. Call once at startup.
pub fn init(settings: &Settings) {
    ENABLED.store(settings.logging.enabled, Ordering::Relaxed);
}

/// Route uncaught panics through the diagnostic log, then the default hook.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error("panic", &info.to_string());
        default_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

pub fn info(source: &str, message: &str) {
    record(Severity::Info, source, message);
}

pub fn warn(source: &str, message: &str) {
    record(Severity::Warn, source, message);
}

pub fn error(source: &str, message: &str) {
    record(Severity::Error, source, message);
}

/// Append an entry. Silently does nothing when logging is disabled or the
/// file cannot be written.
pub fn record(severity: Severity, source: &str, message: &str) {
    if !ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let entry = DiagnosticEntry {
        timestamp: Utc::now().to_rfc3339(),
        severity,
        source: source.to_string(),
        message: message.to_string(),
    };
    let _ = append_entry(&entry);
}

fn append_entry(entry: &DiagnosticEntry) -> anyhow::Result<()> {
    let Some(path) = diagnostics_log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read every entry, skipping malformed lines.
pub fn read_entries() -> Vec<DiagnosticEntry> {
    let Some(path) = diagnostics_log_path() else {
        return Vec::new();
    };
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<DiagnosticEntry>(&line).ok())
        .collect()
}

/// Path of the diagnostic log file.
pub fn diagnostics_log_path() -> Option<PathBuf> {
    settings::data_dir().map(|dir| dir.join("diagnostics.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
