//! HTTP client for the training backend.
//!
//! The backend exposes four endpoints:
//!
//! | Method | Path                 | Body / result                 |
//! |--------|----------------------|-------------------------------|
//! | GET    | `/config`            | → [`TrainingConfig`]          |
//! | POST   | `/config`            | [`TrainingConfig`] → any JSON |
//! | GET    | `/logs[?level=L]`    | → `[LogRecord]`               |
//! | POST   | `/logs/clear`        | → acknowledgement             |
//!
//! Controllers depend on the [`Backend`] trait rather than on [`HttpBackend`]
//! so they can be driven by an in-memory backend in tests.

mod error;
mod http;

use serde::{Deserialize, Serialize};

use crate::editor::schema::TrainingConfig;

pub use error::{ClientError, ErrorKind};
pub use http::HttpBackend;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One log record as returned by `GET /logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: String,
    /// `INFO`, `DEBUG`, `WARNING`, `ERROR`, or `CRITICAL`.
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Either a JSON-encoded string (what the backend stores) or an object.
    #[serde(default)]
    pub context: serde_json::Value,
}

impl LogRecord {
    /// Convenience constructor used by tests and demos.
    pub fn new(timestamp: &str, level: &str, module: &str, message: &str) -> Self {
        Self {
            id: None,
            timestamp: timestamp.to_string(),
            level: level.to_string(),
            module: Some(module.to_string()),
            message: message.to_string(),
            context: serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// The four backend operations the front-ends use.
pub trait Backend {
    /// `GET /config`.
    fn fetch_config(&self) -> Result<TrainingConfig, ClientError>;

    /// `POST /config` with the full configuration. Returns the server's
    /// acknowledgement (`Null` for an empty body).
    fn save_config(&self, config: &TrainingConfig) -> Result<serde_json::Value, ClientError>;

    /// `GET /logs`, or `GET /logs?level=<level>` when a level is given.
    fn fetch_logs(&self, level: Option<&str>) -> Result<Vec<LogRecord>, ClientError>;

    /// `POST /logs/clear`.
    fn clear_logs(&self) -> Result<(), ClientError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn fetch_config(&self) -> Result<TrainingConfig, ClientError> {
        (**self).fetch_config()
    }

    fn save_config(&self, config: &TrainingConfig) -> Result<serde_json::Value, ClientError> {
        (**self).save_config(config)
    }

    fn fetch_logs(&self, level: Option<&str>) -> Result<Vec<LogRecord>, ClientError> {
        (**self).fetch_logs(level)
    }

    fn clear_logs(&self) -> Result<(), ClientError> {
        (**self).clear_logs()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_record_accepts_backend_shape() {
        let json = r#"{
            "id": "3",
            "timestamp": "2024-05-01T10:15:30.123456",
            "level": "ERROR",
            "message": "CUDA out of memory",
            "module": "trainer",
            "context": "{\"batch\": 64}"
        }"#;
        let record: LogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.level, "ERROR");
        assert_eq!(record.module.as_deref(), Some("trainer"));
        assert_eq!(record.context, serde_json::json!("{\"batch\": 64}"));
    }

    #[test]
    fn log_record_tolerates_missing_fields() {
        let record: LogRecord = serde_json::from_str(r#"{"level": "INFO"}"#).unwrap();
        assert!(record.module.is_none());
        assert!(record.context.is_null());
        assert_eq!(record.message, "");
    }
}
