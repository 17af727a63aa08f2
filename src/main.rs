use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use trainboard::render::LogFormat;
use trainboard::{cli, diagnostics, settings};

#[derive(Debug, Parser)]
#[command(name = "trainboard")]
#[command(about = "Training configuration editor and live system monitor")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// View and edit the training configuration on the backend
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List or clear backend logs
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
    /// Live dashboard: metrics, charts, and logs
    Monitor {
        /// Only show logs of this level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
        #[arg(long)]
        level: Option<String>,
    },
    /// Show or change the dashboard theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Manage trainboard settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Check the backend, the push channel, and local files
    Health,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Fetch and display the configuration
    Show {
        /// Output format: form (default), json
        #[arg(long, default_value = "form")]
        format: String,
    },
    /// Change form controls and save, e.g. `--set epochs=20 --set augment=true`
    Edit {
        /// Control assignment `<id>=<value>` (repeatable)
        #[arg(long = "set", value_name = "ID=VALUE", required = true)]
        assignments: Vec<String>,
        /// Print the configuration that would be saved instead of saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// Save a configuration from a JSON file
    Push {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Print the default configuration as JSON
    Template,
}

#[derive(Debug, Subcommand)]
enum LogsAction {
    /// Fetch and display logs
    List {
        /// Only show logs of this level
        #[arg(long)]
        level: Option<String>,
        /// Output format: table (default), json, csv, html
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Delete all logs on the backend, then show what remains
    Clear {
        /// Level filter for the listing shown afterwards
        #[arg(long)]
        level: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeAction {
    /// Print the current theme and where it comes from
    Show,
    /// Switch between light and dark and remember the choice
    Toggle,
    /// Forget the saved choice and follow the system appearance
    Reset,
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Show the effective (merged) settings
    Show,
    /// Write a default settings file to ~/.trainboard/settings.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value by dotted key, e.g. `server.base_url http://host:5000`
    Set { key: String, value: String },
    /// Reset the settings file to defaults
    Reset,
}

fn run(app: App) -> Result<()> {
    match app.command {
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                cli::run_config_show(cli::ConfigFormat::from_str_opt(Some(&format)))
            }
            ConfigAction::Edit {
                assignments,
                dry_run,
            } => cli::run_config_edit(&assignments, dry_run),
            ConfigAction::Push { file } => cli::run_config_push(&file),
            ConfigAction::Template => cli::run_config_template(),
        },
        Commands::Logs { action } => match action {
            LogsAction::List { level, format } => {
                cli::run_logs_list(level.as_deref(), LogFormat::from_str_opt(Some(&format)))
            }
            LogsAction::Clear { level } => cli::run_logs_clear(level.as_deref()),
        },
        Commands::Monitor { level } => cli::monitor::run_monitor(level.as_deref()),
        Commands::Theme { action } => match action {
            ThemeAction::Show => cli::run_theme_show(),
            ThemeAction::Toggle => cli::run_theme_toggle(),
            ThemeAction::Reset => cli::run_theme_reset(),
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show => cli::run_settings_show(),
            SettingsAction::Init { force } => cli::run_settings_init(force),
            SettingsAction::Set { key, value } => cli::run_settings_set(&key, &value),
            SettingsAction::Reset => cli::run_settings_reset(),
        },
        Commands::Health => cli::run_health(),
    }
}

fn main() {
    let app = App::parse();
    diagnostics::init(&settings::load());
    diagnostics::install_panic_hook();

    if let Err(e) = run(app) {
        diagnostics::error("cli", &format!("{e:#}"));
        eprintln!("[trainboard] {e:#}");
        std::process::exit(1);
    }
}
