//! Light/dark theme state and its persisted preference.
//!
//! Resolution order at startup: the persisted preference, then the system
//! appearance, then `light`. Only an explicit toggle writes the preference;
//! system appearance changes are followed until the user has chosen.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

use crate::settings::{self, SystemAppearance};

/// Key under which the theme is stored in the preference file.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => bail!("unknown theme '{other}' (expected light or dark)"),
        }
    }
}

// ---------------------------------------------------------------------------
// System appearance
// ---------------------------------------------------------------------------

/// Appearance reported by the environment, if any.
pub fn system_appearance(setting: SystemAppearance) -> Option<Theme> {
    match setting {
        SystemAppearance::Light => Some(Theme::Light),
        SystemAppearance::Dark => Some(Theme::Dark),
        SystemAppearance::Auto => std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| appearance_from_colorfgbg(&value)),
    }
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); the background index
/// decides. Indices 0-6 and 8 are dark colors in the standard palette.
pub fn appearance_from_colorfgbg(value: &str) -> Option<Theme> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        0..=6 | 8 => Some(Theme::Dark),
        _ => Some(Theme::Light),
    }
}

/// Remembers the last observed system appearance and reports changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppearanceWatch {
    last: Option<Theme>,
}

impl AppearanceWatch {
    pub fn new(initial: Option<Theme>) -> Self {
        Self { last: initial }
    }

    /// Record `current`; returns it when it differs from the previous
    /// observation. An unknown appearance is never reported.
    pub fn observe(&mut self, current: Option<Theme>) -> Option<Theme> {
        let changed = current.filter(|theme| self.last != Some(*theme));
        self.last = current;
        changed
    }
}

// ---------------------------------------------------------------------------
// Preference storage
// ---------------------------------------------------------------------------

/// Key-value store holding the user's explicit theme choice.
pub trait PreferenceStore {
    fn load(&self) -> Option<Theme>;
    fn save(&mut self, theme: Theme) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// `~/.trainboard/preferences.json`, a flat JSON object.
///
/// Unknown keys in the file are preserved on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location, if a home directory exists.
    pub fn default_location() -> Option<Self> {
        settings::data_dir().map(|dir| Self::new(dir.join("preferences.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Map<String, Value> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn write_map(&self, map: Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl PreferenceStore for FileStore {
    fn load(&self) -> Option<Theme> {
        self.read_map()
            .get(THEME_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    fn save(&mut self, theme: Theme) -> Result<()> {
        let mut map = self.read_map();
        map.insert(THEME_KEY.to_string(), Value::String(theme.to_string()));
        self.write_map(map)
    }

    fn clear(&mut self) -> Result<()> {
        let mut map = self.read_map();
        if map.remove(THEME_KEY).is_some() {
            self.write_map(map)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and for running without a home directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub value: Option<Theme>,
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Option<Theme> {
        self.value
    }

    fn save(&mut self, theme: Theme) -> Result<()> {
        self.value = Some(theme);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.value = None;
        Ok(())
    }
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for Box<P> {
    fn load(&self) -> Option<Theme> {
        (**self).load()
    }
    fn save(&mut self, theme: Theme) -> Result<()> {
        (**self).save(theme)
    }
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ThemeManager<P: PreferenceStore> {
    store: P,
    theme: Theme,
}

impl<P: PreferenceStore> ThemeManager<P> {
    /// Resolve the initial theme. Nothing is persisted here.
    pub fn new(store: P, system: Option<Theme>) -> Self {
        let theme = store.load().or(system).unwrap_or_default();
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether the user has an explicit choice on record.
    pub fn has_preference(&self) -> bool {
        self.store.load().is_some()
    }

    /// Flip the theme and persist the choice.
    ///
    /// The in-memory theme flips even when persisting fails.
    pub fn toggle(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggled();
        self.store.save(self.theme)?;
        Ok(self.theme)
    }

    /// Follow a system appearance change unless the user has chosen.
    /// Returns whether the theme changed.
    pub fn on_system_change(&mut self, system: Theme) -> bool {
        if self.has_preference() || self.theme == system {
            return false;
        }
        self.theme = system;
        true
    }

    /// Forget the persisted choice and fall back to `system`.
    pub fn reset(&mut self, system: Option<Theme>) -> Result<Theme> {
        self.store.clear()?;
        self.theme = system.unwrap_or_default();
        Ok(self.theme)
    }

    pub fn store(&self) -> &P {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
