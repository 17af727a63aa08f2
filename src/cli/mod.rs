//! CLI command implementations for trainboard.
//!
//! Provides subcommand handlers for:
//! - `trainboard config show|edit|push|template` for the training configuration
//! - `trainboard logs list|clear` for the backend log store
//! - `trainboard monitor` for the live dashboard (see [`monitor`])
//! - `trainboard theme show|toggle|reset` for the dashboard theme preference
//! - `trainboard settings show|init|set|reset` for client settings
//! - `trainboard health` to check the backend and local files

pub mod monitor;

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::client::{Backend, HttpBackend};
use crate::dashboard::charts::Palette;
use crate::dashboard::logs::LogViewer;
use crate::dashboard::theme::{self, FileStore, MemoryStore, PreferenceStore, ThemeManager};
use crate::diagnostics;
use crate::editor::{ConfigEditor, TrainingConfig};
use crate::feed::PushChannel;
use crate::notice::{Notice, NoticeKind, StatusSink};
use crate::render::{self, LogFormat};
use crate::settings::{self, Settings};

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Form,
    Json,
}

impl ConfigFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Form,
        }
    }
}

/// Reports editor progress on stderr so stdout stays clean for output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn loading(&mut self, _active: bool) {}

    fn notice(&mut self, notice: &Notice) {
        let line = match notice.kind {
            NoticeKind::Success => format!("{} {}", "✓".green().bold(), notice.message),
            NoticeKind::Danger => format!("{} {}", "✗".red().bold(), notice.message.red()),
        };
        eprintln!("{line}");
    }
}

/// The preference file, or an in-memory store when there is no home
/// directory.
pub fn preference_store() -> Box<dyn PreferenceStore> {
    match FileStore::default_location() {
        Some(store) => Box::new(store),
        None => Box::new(MemoryStore::default()),
    }
}

fn theme_manager(settings: &Settings) -> ThemeManager<Box<dyn PreferenceStore>> {
    ThemeManager::new(
        preference_store(),
        theme::system_appearance(settings.theme.system),
    )
}

// ---------------------------------------------------------------------------
// trainboard config
// ---------------------------------------------------------------------------

/// Fetch the configuration and print it.
pub fn run_config_show(format: ConfigFormat) -> Result<()> {
    let settings = settings::load();
    let backend = HttpBackend::from_settings(&settings.server);
    let mut editor = ConfigEditor::new(&backend, ConsoleSink);
    editor.load_config()?;

    match format {
        ConfigFormat::Json => {
            let config = editor.form_data()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigFormat::Form => {
            println!("{}", "Training Configuration".bold().cyan());
            println!("{}", "=".repeat(50));
            print!("{}", render::render_form(editor.form()));
        }
    }
    Ok(())
}

/// Split `id=value`.
fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    match assignment.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((id.trim(), value)),
        _ => bail!("expected <control>=<value>, got '{assignment}'"),
    }
}

/// Load, apply `id=value` edits to the form, and save.
pub fn run_config_edit(assignments: &[String], dry_run: bool) -> Result<()> {
    let settings = settings::load();
    let backend = HttpBackend::from_settings(&settings.server);
    let mut editor = ConfigEditor::new(&backend, ConsoleSink);
    editor.load_config()?;

    for assignment in assignments {
        let (id, value) = parse_assignment(assignment)?;
        editor.input(id, value)?;
    }

    if dry_run {
        let config = editor.form_data()?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        println!("{}", "(dry run, nothing saved)".dimmed());
        return Ok(());
    }

    editor.save_config()?;
    Ok(())
}

/// Send a configuration file through the form and save it.
pub fn run_config_push(path: &Path) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let config: TrainingConfig = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid training configuration", path.display()))?;

    let settings = settings::load();
    let backend = HttpBackend::from_settings(&settings.server);
    let mut editor = ConfigEditor::new(&backend, ConsoleSink);
    editor.populate(&config);
    let ack = editor.save_config()?;
    if !ack.is_null() {
        println!("{}", serde_json::to_string_pretty(&ack)?);
    }
    Ok(())
}

/// Print the built-in default configuration.
pub fn run_config_template() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&TrainingConfig::default())?);
    Ok(())
}

// ---------------------------------------------------------------------------
// trainboard logs
// ---------------------------------------------------------------------------

fn fetch_into_viewer(backend: &HttpBackend, level: Option<&str>) -> Result<LogViewer> {
    let mut viewer = LogViewer::new();
    let ticket = viewer.begin_fetch(level);
    let records = backend.fetch_logs(ticket.level()).map_err(|e| {
        diagnostics::error("logs", &format!("error fetching logs: {e}"));
        e
    })?;
    viewer.apply(&ticket, records);
    Ok(viewer)
}

pub fn run_logs_list(level: Option<&str>, format: LogFormat) -> Result<()> {
    let settings = settings::load();
    let backend = HttpBackend::from_settings(&settings.server);
    let viewer = fetch_into_viewer(&backend, level)?;
    let palette = Palette::for_theme(theme_manager(&settings).theme());
    print!("{}", render::render_logs(&viewer, format, palette)?);
    Ok(())
}

/// Clear the log store, then show what is left for `level`.
pub fn run_logs_clear(level: Option<&str>) -> Result<()> {
    let settings = settings::load();
    let backend = HttpBackend::from_settings(&settings.server);
    backend.clear_logs().map_err(|e| {
        diagnostics::error("logs", &format!("error clearing logs: {e}"));
        e
    })?;
    println!("{} Logs cleared", "✓".green().bold());

    let viewer = fetch_into_viewer(&backend, level)?;
    let palette = Palette::for_theme(theme_manager(&settings).theme());
    print!("{}", render::render_logs(&viewer, LogFormat::Table, palette)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// trainboard theme
// ---------------------------------------------------------------------------

pub fn run_theme_show() -> Result<()> {
    let settings = settings::load();
    let manager = theme_manager(&settings);
    let source = if manager.has_preference() {
        "saved preference"
    } else if theme::system_appearance(settings.theme.system).is_some() {
        "system appearance"
    } else {
        "default"
    };
    println!("{} {}", manager.theme().to_string().bold(), format!("({source})").dimmed());
    Ok(())
}

pub fn run_theme_toggle() -> Result<()> {
    let settings = settings::load();
    let mut manager = theme_manager(&settings);
    let theme = manager.toggle()?;
    println!("{} Theme set to {}", "✓".green().bold(), theme.to_string().bold());
    Ok(())
}

pub fn run_theme_reset() -> Result<()> {
    let settings = settings::load();
    let mut manager = theme_manager(&settings);
    let theme = manager.reset(theme::system_appearance(settings.theme.system))?;
    println!(
        "{} Theme preference cleared, now following {}",
        "✓".green().bold(),
        theme.to_string().bold()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// trainboard settings show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) settings as TOML.
pub fn run_settings_show() -> Result<()> {
    let toml_str = settings::show_effective_settings()?;
    println!("{}", "Effective trainboard Settings".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = settings::global_settings_file().is_some_and(|p| p.exists());
    let project_exists = settings::project_settings_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.trainboard/settings.toml");
    print_source(project_exists, ".trainboard.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "TRAINBOARD_* environment variables".dimmed()
    );
    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

pub fn run_settings_init(force: bool) -> Result<()> {
    let path = settings::init_settings(force)?;
    println!(
        "{} Settings written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn run_settings_set(key: &str, value: &str) -> Result<()> {
    settings::set_setting(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_settings_reset() -> Result<()> {
    let path = settings::reset_settings()?;
    println!(
        "{} Settings reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// trainboard health
// ---------------------------------------------------------------------------

/// Check settings files, both REST endpoints, the push channel, and the
/// local state files.
pub fn run_health() -> Result<()> {
    println!("{}", "trainboard Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let settings = settings::load();
    let global_exists = settings::global_settings_file().is_some_and(|p| p.exists());
    print_health_item(
        "Settings file",
        global_exists,
        if global_exists {
            "~/.trainboard/settings.toml found"
        } else {
            "not found (run `trainboard settings init` to create)"
        },
    );
    print_health_item("Backend", true, &settings.server.base_url);

    let backend = HttpBackend::from_settings(&settings.server);
    match backend.fetch_config() {
        Ok(config) => print_health_item(
            "GET /config",
            true,
            &format!("architecture {}", config.model.architecture),
        ),
        Err(e) => print_health_item("GET /config", false, &e.to_string()),
    }
    match backend.fetch_logs(None) {
        Ok(records) => print_health_item("GET /logs", true, &format!("{} records", records.len())),
        Err(e) => print_health_item("GET /logs", false, &e.to_string()),
    }

    let channel = PushChannel::from_settings(&settings.server);
    let probe_timeout = Duration::from_millis(settings.server.timeout_ms.max(1000));
    match channel.probe(probe_timeout) {
        Ok(()) => print_health_item("Push channel", true, channel.url()),
        Err(e) => print_health_item("Push channel", false, &e.to_string()),
    }

    let manager = theme_manager(&settings);
    print_health_item(
        "Theme",
        true,
        &format!(
            "{}{}",
            manager.theme(),
            if manager.has_preference() { " (saved)" } else { "" }
        ),
    );

    let log_exists = diagnostics::diagnostics_log_path().is_some_and(|p| p.exists());
    print_health_item(
        "Diagnostic log",
        true,
        &if !settings.logging.enabled {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", diagnostics::read_entries().len())
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_parsing() {
        assert_eq!(parse_assignment("epochs=20").unwrap(), ("epochs", "20"));
        assert_eq!(parse_assignment("image_dir=a=b").unwrap(), ("image_dir", "a=b"));
        assert_eq!(parse_assignment("raw_path=").unwrap(), ("raw_path", ""));
        assert!(parse_assignment("epochs").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn config_format_parsing() {
        assert_eq!(ConfigFormat::from_str_opt(Some("json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_str_opt(Some("form")), ConfigFormat::Form);
        assert_eq!(ConfigFormat::from_str_opt(None), ConfigFormat::Form);
    }
}
