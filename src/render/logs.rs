//! Log list output for `logs list`: table, JSON, CSV, and HTML.

use anyhow::Result;
use colored::{ColoredString, Colorize};

use super::text::{csv_field, single_line, strip_control, truncate};
use crate::client::LogRecord;
use crate::dashboard::charts::{Palette, hex_to_rgb};
use crate::dashboard::logs::{
    LogRow, LogStats, LogViewer, NO_LOGS, display_module, escape_html, format_context,
};

/// Output format for `logs list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Table,
    Json,
    Csv,
    Html,
}

impl LogFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            Some("html") => Self::Html,
            _ => Self::Table,
        }
    }
}

pub fn render_logs(viewer: &LogViewer, format: LogFormat, palette: &Palette) -> Result<String> {
    match format {
        LogFormat::Table => Ok(render_table(viewer, palette, usize::MAX)),
        LogFormat::Json => Ok(serde_json::to_string_pretty(viewer.filtered())?),
        LogFormat::Csv => Ok(render_csv(viewer.filtered())),
        LogFormat::Html => Ok(render_html(viewer)),
    }
}

/// Color a level name with the palette's semantic colors.
pub fn level_badge(level: &str, palette: &Palette) -> ColoredString {
    let color = match level {
        "ERROR" | "CRITICAL" => Some(palette.error),
        "WARNING" => Some(palette.warning),
        "INFO" => Some(palette.info),
        _ => None,
    };
    let padded = format!("{level:<8}");
    match color.and_then(hex_to_rgb) {
        Some((r, g, b)) => padded.truecolor(r, g, b).bold(),
        None => padded.dimmed(),
    }
}

pub fn stats_line(stats: LogStats) -> String {
    format!(
        "{} {}   {} {}   {} {}",
        "Total:".bold(),
        stats.total,
        "Errors:".bold(),
        stats.errors,
        "Warnings:".bold(),
        stats.warnings
    )
}

/// Newest rows last, at most `limit` of them.
pub fn render_table(viewer: &LogViewer, palette: &Palette, limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&stats_line(viewer.stats()));
    if let Some(level) = viewer.filter() {
        out.push_str(&format!("   {} {level}", "Filter:".bold()));
    }
    out.push('\n');

    if let Some(placeholder) = viewer.placeholder() {
        out.push_str(&format!("  {}\n", placeholder.dimmed()));
        return out;
    }

    let rows = viewer.rows();
    let skip = rows.len().saturating_sub(limit);
    for row in rows.iter().skip(skip) {
        out.push_str(&table_row(row, palette));
    }
    out
}

fn table_row(row: &LogRow, palette: &Palette) -> String {
    let module = strip_control(&row.module);
    let message = strip_control(&row.message);
    let mut line = format!(
        "  {}  {}  {:<12}  {}\n",
        row.timestamp.dimmed(),
        level_badge(&row.level, palette),
        truncate(&module, 12),
        message
    );
    let context = single_line(&strip_control(&row.context));
    if !context.is_empty() {
        line.push_str(&format!("      {}\n", truncate(&context, 160).dimmed()));
    }
    line
}

fn render_csv(records: &[LogRecord]) -> String {
    let mut out = String::from("timestamp,level,module,message,context\n");
    for record in records {
        let module = display_module(record);
        let context = format_context(&record.context);
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&record.timestamp),
            csv_field(&record.level),
            csv_field(&module),
            csv_field(&record.message),
            csv_field(&context)
        ));
    }
    out
}

fn render_html(viewer: &LogViewer) -> String {
    let stats = viewer.stats();
    let mut out = String::new();
    out.push_str(&format!(
        "<div class=\"logs-stats\"><span id=\"total-logs\">{}</span><span id=\"error-logs\">{}</span><span id=\"warning-logs\">{}</span></div>\n",
        stats.total, stats.errors, stats.warnings
    ));
    out.push_str("<div id=\"logs-list\">\n");
    if viewer.placeholder().is_some() {
        out.push_str(&format!("<div class=\"no-logs\"><p>{NO_LOGS}</p></div>\n"));
    }
    for row in viewer.rows() {
        // Level and module are escaped too; the level doubles as a class name.
        let level = escape_html(&row.level);
        out.push_str(&format!(
            "<div class=\"log-entry\"><div class=\"log-timestamp\">{}</div><div class=\"log-level {level}\">{level}</div><div class=\"log-module\">{}</div><div class=\"log-message\">{}</div><div class=\"log-context\">{}</div></div>\n",
            escape_html(&row.timestamp),
            escape_html(&row.module),
            row.message,
            row.context
        ));
    }
    out.push_str("</div>\n");
    out
}
