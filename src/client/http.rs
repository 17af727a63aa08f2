//! Synchronous HTTP implementation of [`Backend`] on top of `ureq`.
//!
//! One [`HttpBackend`] is built per command from the `[server]` settings and
//! cloned into worker threads when the dashboard fetches logs in the
//! background (the underlying agent shares its connection pool).

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{Backend, ClientError, LogRecord};
use crate::editor::schema::TrainingConfig;
use crate::settings::schema::ServerSettings;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    /// Build a client for `base_url`. `timeout` of `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            // "localhost" may resolve to ::1 first while the backend only
            // binds IPv4.
            base_url: base_url
                .trim_end_matches('/')
                .replace("://localhost", "://127.0.0.1"),
            agent: builder.build(),
        }
    }

    /// Build a client from the resolved `[server]` settings.
    pub fn from_settings(server: &ServerSettings) -> Self {
        let timeout = (server.timeout_ms > 0).then(|| Duration::from_millis(server.timeout_ms));
        Self::new(&server.base_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read_json<T: DeserializeOwned>(
        url: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, ClientError> {
        let body = Self::read_body(url, result)?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn read_body(
        url: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<String, ClientError> {
        let response = result.map_err(|e| map_ureq_error(url, e))?;
        response.into_string().map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn map_ureq_error(url: &str, error: ureq::Error) -> ClientError {
    match error {
        ureq::Error::Status(status, _) => ClientError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => ClientError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

impl Backend for HttpBackend {
    fn fetch_config(&self) -> Result<TrainingConfig, ClientError> {
        let url = self.url("/config");
        Self::read_json(&url, self.agent.get(&url).call())
    }

    fn save_config(&self, config: &TrainingConfig) -> Result<serde_json::Value, ClientError> {
        let url = self.url("/config");
        let payload =
            serde_json::to_value(config).map_err(|e| ClientError::Encode(e.to_string()))?;
        let body = Self::read_body(&url, self.agent.post(&url).send_json(payload))?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode {
            url,
            message: e.to_string(),
        })
    }

    fn fetch_logs(&self, level: Option<&str>) -> Result<Vec<LogRecord>, ClientError> {
        let url = self.url("/logs");
        let mut request = self.agent.get(&url);
        if let Some(level) = level.filter(|l| !l.is_empty()) {
            request = request.query("level", level);
        }
        Self::read_json(&url, request.call())
    }

    fn clear_logs(&self) -> Result<(), ClientError> {
        let url = self.url("/logs/clear");
        Self::read_body(&url, self.agent.post(&url).call()).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
