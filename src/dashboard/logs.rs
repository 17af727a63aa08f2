//! Log viewer state: the fetched list, the level filter, and the counters.
//!
//! Fetches run in the background and may complete out of order. Each request
//! takes a [`LogTicket`] carrying a sequence number; a response is applied
//! only if its ticket is the most recent one issued.

use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;

use crate::client::LogRecord;

/// Shown in place of the list when there is nothing to display.
pub const NO_LOGS: &str = "No logs available";

/// Shown when a record has no module.
pub const DEFAULT_MODULE: &str = "System";

pub const LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

const DISPLAY_TIMESTAMP: &str = "%d/%m/%Y %H:%M:%S";

/// Identifies one log request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTicket {
    seq: u64,
    level: Option<String>,
}

impl LogTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Level filter the request was issued with.
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }
}

/// Counters over the full (unfiltered) list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    pub total: usize,
    /// `ERROR` plus `CRITICAL`.
    pub errors: usize,
    pub warnings: usize,
}

impl LogStats {
    pub fn compute(logs: &[LogRecord]) -> Self {
        Self {
            total: logs.len(),
            errors: logs
                .iter()
                .filter(|l| l.level == "ERROR" || l.level == "CRITICAL")
                .count(),
            warnings: logs.iter().filter(|l| l.level == "WARNING").count(),
        }
    }
}

/// A record prepared for display, with message and context escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub timestamp: String,
    pub level: String,
    pub module: String,
    pub message: String,
    pub context: String,
}

impl LogRow {
    pub fn from_record(record: &LogRecord) -> Self {
        Self {
            timestamp: format_timestamp(&record.timestamp),
            level: record.level.clone(),
            module: display_module(record),
            message: escape_html(&record.message),
            context: escape_html(&format_context(&record.context)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogViewer {
    logs: Vec<LogRecord>,
    filtered: Vec<LogRecord>,
    filter: Option<String>,
    stats: LogStats,
    issued: u64,
}

impl LogViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `level` (`None` or empty means all levels).
    pub fn begin_fetch(&mut self, level: Option<&str>) -> LogTicket {
        self.issued += 1;
        LogTicket {
            seq: self.issued,
            level: normalize_level(level),
        }
    }

    /// Retire every outstanding ticket without issuing a new one.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }

    /// Whether `ticket` belongs to the most recent request.
    pub fn is_current(&self, ticket: &LogTicket) -> bool {
        ticket.seq == self.issued
    }

    /// Apply a successful response. Returns `false` and changes nothing when
    /// a newer request has been issued since.
    pub fn apply(&mut self, ticket: &LogTicket, logs: Vec<LogRecord>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.logs = logs;
        self.filter = ticket.level.clone();
        self.stats = LogStats::compute(&self.logs);
        self.refilter();
        true
    }

    /// Change the filter locally, without fetching.
    pub fn set_filter(&mut self, level: Option<&str>) {
        self.filter = normalize_level(level);
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = match &self.filter {
            Some(level) => self
                .logs
                .iter()
                .filter(|record| &record.level == level)
                .cloned()
                .collect(),
            None => self.logs.clone(),
        };
    }

    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    pub fn filtered(&self) -> &[LogRecord] {
        &self.filtered
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn stats(&self) -> LogStats {
        self.stats
    }

    pub fn rows(&self) -> Vec<LogRow> {
        self.filtered.iter().map(LogRow::from_record).collect()
    }

    /// The placeholder text when the filtered view is empty.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.filtered.is_empty().then_some(NO_LOGS)
    }
}

/// Levels are stored upper-case by the backend, which also upper-cases the
/// query, so the local filter must match that.
fn normalize_level(level: Option<&str>) -> Option<String> {
    level
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_ascii_uppercase)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Escape the characters that are significant in HTML text content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strings are shown as-is, empty values as nothing, everything else as
/// pretty-printed JSON.
pub fn format_context(context: &Value) -> String {
    match context {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(false) => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub fn display_module(record: &LogRecord) -> String {
    match record.module.as_deref() {
        Some(module) if !module.is_empty() => module.to_string(),
        _ => DEFAULT_MODULE.to_string(),
    }
}

/// `DD/MM/YYYY HH:MM:SS` in local time, or the input verbatim when it is
/// not a recognizable timestamp. Timestamps without an offset are taken as
/// local time already.
pub fn format_timestamp(timestamp: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.with_timezone(&Local).format(DISPLAY_TIMESTAMP).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, pattern) {
            return naive.format(DISPLAY_TIMESTAMP).to_string();
        }
    }
    timestamp.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
