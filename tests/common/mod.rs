//! In-process stand-in for the training backend, built on `tiny_http`.
#![allow(dead_code)]

use std::io::Read;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{Value, json};
use tiny_http::{Header, Method, Response, Server, StatusCode};

/// Shared state the mock serves and records.
#[derive(Debug, Default)]
pub struct MockState {
    pub config: Value,
    pub logs: Vec<Value>,
    /// Bodies of every `POST /config`.
    pub saved: Vec<Value>,
    /// Answer every request with this status instead.
    pub fail_with: Option<u16>,
    /// Answer `GET /config` with this raw body instead.
    pub raw_config: Option<String>,
    pub requests: Vec<String>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn start(state: MockState) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock backend");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock backend listens on TCP");
        let state = Arc::new(Mutex::new(state));
        let shared = Arc::clone(&state);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let (status, payload) = handle(&shared, request.method(), request.url(), &body);
                let response = Response::from_data(payload.into_bytes())
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json").expect("header"),
                    )
                    .with_status_code(StatusCode(status));
                let _ = request.respond(response);
            }
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

fn handle(state: &Mutex<MockState>, method: &Method, url: &str, body: &str) -> (u16, String) {
    let mut state = state.lock().expect("mock state lock");
    state.requests.push(format!("{method} {url}"));
    if let Some(status) = state.fail_with {
        return (status, json!({"error": "forced failure"}).to_string());
    }

    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    match (method, path) {
        (Method::Get, "/config") => match &state.raw_config {
            Some(raw) => (200, raw.clone()),
            None => (200, state.config.to_string()),
        },
        (Method::Post, "/config") => match serde_json::from_str::<Value>(body) {
            Ok(config) => {
                state.config = config.clone();
                state.saved.push(config);
                (200, json!({"message": "Configuration updated"}).to_string())
            }
            Err(e) => (400, json!({"error": e.to_string()}).to_string()),
        },
        (Method::Get, "/logs") => {
            let level = query
                .split('&')
                .find_map(|pair| pair.strip_prefix("level="))
                .filter(|l| !l.is_empty());
            let logs: Vec<&Value> = state
                .logs
                .iter()
                .filter(|log| level.is_none_or(|l| log["level"] == l))
                .collect();
            (200, serde_json::to_string(&logs).expect("serialize logs"))
        }
        (Method::Post, "/logs/clear") => {
            state.logs.clear();
            (200, json!({"message": "Logs cleared"}).to_string())
        }
        _ => (404, json!({"error": "not found"}).to_string()),
    }
}

pub fn log(id: u64, level: &str, module: Option<&str>, message: &str) -> Value {
    json!({
        "id": id,
        "timestamp": format!("2024-05-0{}T12:00:00", id % 9 + 1),
        "level": level,
        "module": module,
        "message": message,
        "context": "{}",
    })
}

pub fn sample_logs() -> Vec<Value> {
    vec![
        log(1, "INFO", Some("trainer"), "Training started"),
        log(2, "WARNING", Some("loader"), "Skipped 3 rows"),
        log(3, "ERROR", Some("trainer"), "NaN loss"),
        log(4, "CRITICAL", None, "CUDA out of memory"),
        log(5, "DEBUG", Some("loader"), "batch 12"),
    ]
}
