/// Client settings for trainboard.
///
/// Provides a layered hierarchy:
///
/// 1. **Built-in defaults**: [`schema::Settings::default()`]
/// 2. **User global settings**: `~/.trainboard/settings.toml`
/// 3. **Project local settings**: `.trainboard.toml` in the current directory
/// 4. **Environment variables**: `TRAINBOARD_*` overrides (highest precedence)
///
/// Later layers override earlier ones key by key: a file that only sets
/// `server.base_url` leaves every other value from the previous layer intact.
///
/// # Usage
///
/// ```rust,ignore
/// use trainboard::settings;
///
/// let settings = settings::load();
/// let url = settings.server.socket_url();
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diagnostics;

pub use schema::{Settings, SystemAppearance};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the fully resolved settings.
///
/// Merges defaults → global TOML → project TOML → env vars. A file that is
/// malformed or does not fit the schema is skipped on its own; the layers
/// around it still apply.
pub fn load() -> Settings {
    let paths: Vec<PathBuf> = [global_settings_path(), project_settings_path()]
        .into_iter()
        .flatten()
        .collect();
    let mut settings = load_layers(&paths);
    apply_env_overrides(&mut settings);
    settings
}

/// Merge the given files over the defaults, in order, without env overrides.
pub fn load_layers(paths: &[PathBuf]) -> Settings {
    let mut tree = defaults_tree();

    for path in paths {
        let Some(layer) = load_toml_tree(path) else {
            continue;
        };
        let mut candidate = tree.clone();
        merge_tree(&mut candidate, layer);
        match candidate.clone().try_into::<Settings>() {
            Ok(_) => tree = candidate,
            Err(e) => diagnostics::warn(
                "settings",
                &format!("skipping {}: {e}", path.display()),
            ),
        }
    }

    tree.try_into().unwrap_or_default()
}

fn defaults_tree() -> toml::Value {
    toml::Value::try_from(Settings::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Parse a TOML file into a raw value tree, or `None` if missing/malformed.
fn load_toml_tree(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    value.is_table().then_some(value)
}

/// Overlay `layer` onto `base`, descending into tables so only keys present
/// in `layer` are replaced.
fn merge_tree(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base_table), toml::Value::Table(layer_table)) => {
            for (key, value) in layer_table {
                match base_table.get_mut(&key) {
                    Some(existing) if existing.is_table() && value.is_table() => {
                        merge_tree(existing, value);
                    }
                    _ => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding every file trainboard writes: `~/.trainboard/`.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".trainboard"))
}

fn global_settings_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("settings.toml"))
}

fn project_settings_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".trainboard.toml"))
}

/// Path of the global settings file, for display.
pub fn global_settings_file() -> Option<PathBuf> {
    global_settings_path()
}

/// Path of the project settings file, for display.
pub fn project_settings_file() -> Option<PathBuf> {
    project_settings_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `TRAINBOARD_URL`: backend base URL
/// - `TRAINBOARD_TIMEOUT_MS`: HTTP timeout (`0` disables)
/// - `TRAINBOARD_MAX_POINTS`: sliding window size
/// - `TRAINBOARD_SYSTEM_THEME`: `auto`, `light`, or `dark`
/// - `TRAINBOARD_LOGGING`: diagnostic log switch (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("TRAINBOARD_URL")
        && !val.is_empty()
    {
        settings.server.base_url = val;
    }
    if let Ok(val) = std::env::var("TRAINBOARD_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        settings.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("TRAINBOARD_MAX_POINTS")
        && let Ok(points) = val.parse::<usize>()
        && points > 0
    {
        settings.dashboard.max_data_points = points;
    }
    if let Ok(val) = std::env::var("TRAINBOARD_SYSTEM_THEME")
        && let Some(appearance) = parse_appearance(&val)
    {
        settings.theme.system = appearance;
    }
    if let Ok(val) = std::env::var("TRAINBOARD_LOGGING") {
        settings.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_appearance(val: &str) -> Option<SystemAppearance> {
    match val.to_ascii_lowercase().as_str() {
        "auto" => Some(SystemAppearance::Auto),
        "light" => Some(SystemAppearance::Light),
        "dark" => Some(SystemAppearance::Dark),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// init / set / reset / show
// ---------------------------------------------------------------------------

/// Write the annotated defaults to `~/.trainboard/settings.toml`.
///
/// Fails if the file exists unless `force` is set.
pub fn init_settings(force: bool) -> Result<PathBuf> {
    let path = global_settings_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "settings file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.trainboard/ directory")?;
    }

    fs::write(&path, Settings::default_toml()).context("failed to write settings file")?;

    Ok(path)
}

/// Set one dotted key (e.g. `server.base_url`) in the global settings file.
///
/// Starts from the existing file, or from the serialized defaults when there
/// is none, so the value type is always known.
pub fn set_setting(key: &str, value: &str) -> Result<()> {
    let path = global_settings_path().context("could not determine home directory")?;

    // Keys absent from a hand-trimmed file still need a typed slot.
    let mut tree = defaults_tree();
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read settings file")?;
        let existing: toml::Value =
            toml::from_str(&content).context("failed to parse settings as TOML")?;
        merge_tree(&mut tree, existing);
    }

    set_toml_value(&mut tree, key, value)?;

    // Reject values that no longer deserialize (e.g. an unknown enum variant).
    let _: Settings = tree
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&tree).context("failed to serialize settings")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create settings directory")?;
    }
    fs::write(&path, output).context("failed to write settings file")?;

    Ok(())
}

/// Set a value in a TOML tree using a dotted key path.
///
/// The existing value's type decides how `raw_value` is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid settings key '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("settings key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a section above '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' cannot be set from the command line"),
        None => anyhow::bail!("unknown settings key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global settings file to defaults.
pub fn reset_settings() -> Result<PathBuf> {
    init_settings(true)
}

/// Render the effective settings as TOML.
pub fn show_effective_settings() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective settings")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
