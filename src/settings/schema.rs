/// Settings schema and defaults for the trainboard client.
///
/// Defines the TOML-serializable structure with the sections `[server]`,
/// `[dashboard]`, `[theme]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

/// Top-level trainboard settings.
///
/// Maps directly to `~/.trainboard/settings.toml` and `.trainboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub dashboard: DashboardSettings,
    pub theme: ThemeSettings,
    pub logging: LoggingSettings,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Where the training backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// HTTP base URL serving `/config` and `/logs`.
    pub base_url: String,
    /// Socket.IO endpoint path on the same host.
    pub socket_path: String,
    /// Per-request HTTP timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
    /// Delay before the push channel reconnects after losing the server.
    pub reconnect_delay_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            socket_path: "/socket.io/".to_string(),
            timeout_ms: 10_000,
            reconnect_delay_ms: 2_000,
        }
    }
}

impl ServerSettings {
    /// WebSocket URL for the Socket.IO transport, derived from `base_url`.
    pub fn socket_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        let path = format!("/{}", self.socket_path.trim_matches('/'));
        format!("{base}{path}/?EIO=4&transport=websocket")
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Live dashboard behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Number of samples kept per metric in the sliding window.
    pub max_data_points: usize,
    /// Log rows shown below the charts.
    pub log_rows: usize,
    /// How long a notice stays visible, in seconds.
    pub notice_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            max_data_points: 20,
            log_rows: 12,
            notice_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [theme]
// ---------------------------------------------------------------------------

/// Source of the system appearance used when no theme preference is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemAppearance {
    /// Inspect the terminal (`COLORFGBG`).
    #[default]
    Auto,
    Light,
    Dark,
}

impl std::fmt::Display for SystemAppearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    pub system: SystemAppearance,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Append failures and lifecycle events to `~/.trainboard/diagnostics.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

impl Settings {
    /// Annotated default settings file written by `trainboard settings init`.
    pub fn default_toml() -> String {
        r#"# trainboard settings
# Values shown are the built-in defaults.

[server]
base_url = "http://127.0.0.1:5000"
socket_path = "/socket.io/"
timeout_ms = 10000            # 0 disables the HTTP timeout
reconnect_delay_ms = 2000

[dashboard]
max_data_points = 20          # samples kept per metric
log_rows = 12
notice_secs = 5

[theme]
system = "auto"               # auto | light | dark

[logging]
enabled = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_to_defaults() {
        let parsed: Settings = toml::from_str(&Settings::default_toml()).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let parsed: Settings = toml::from_str(
            r#"
[server]
base_url = "http://gpu-box:8080"
"#,
        )
        .unwrap();
        assert_eq!(parsed.server.base_url, "http://gpu-box:8080");
        assert_eq!(parsed.server.timeout_ms, 10_000);
        assert_eq!(parsed.dashboard.max_data_points, 20);
        assert!(parsed.logging.enabled);
    }

    #[test]
    fn socket_url_switches_scheme() {
        let mut server = ServerSettings::default();
        assert_eq!(
            server.socket_url(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );

        server.base_url = "https://monitor.example.com/".to_string();
        server.socket_path = "ws".to_string();
        assert_eq!(
            server.socket_url(),
            "wss://monitor.example.com/ws/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn system_appearance_uses_kebab_case() {
        let parsed: ThemeSettings = toml::from_str(r#"system = "dark""#).unwrap();
        assert_eq!(parsed.system, SystemAppearance::Dark);
        assert_eq!(SystemAppearance::Auto.to_string(), "auto");
    }
}
