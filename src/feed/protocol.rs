//! Socket.IO v4 frame codec for the push channel.
//!
//! The backend speaks Socket.IO over a plain WebSocket. Each text frame is an
//! Engine.IO packet whose first character is the packet type; type `4`
//! carries a Socket.IO packet whose second character is its own type:
//!
//! | Frame                     | Meaning                                  |
//! |---------------------------|------------------------------------------|
//! | `0{"sid":...}`            | transport open, client must send `40`    |
//! | `1`                       | transport close                          |
//! | `2` / `3`                 | ping / pong                              |
//! | `40{...}`                 | namespace connected                      |
//! | `41`                      | namespace disconnected                   |
//! | `42["name", payload]`     | event                                    |
//! | `44{"message": "..."}`    | connect error                            |
//!
//! Socket.IO packets may carry a namespace (`/admin,`) and an ack id
//! (`12`) before the JSON body; both are skipped.

use serde::Deserialize;
use serde_json::Value;

use crate::client::ClientError;

/// Frame the client sends to join the default namespace.
pub const CONNECT_FRAME: &str = "40";

/// Frame the client sends in answer to a ping.
pub const PONG_FRAME: &str = "3";

/// Name of the event carrying system metrics.
pub const PERFORMANCE_EVENT: &str = "performance";

// ---------------------------------------------------------------------------
// Packets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Value),
    Close,
    Ping,
    Pong,
    Connect,
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(String),
    /// Upgrade, noop, acks, and binary packets: nothing to do.
    Ignored,
}

/// Decode one text frame.
pub fn decode(frame: &str) -> Result<Packet, ClientError> {
    let mut chars = frame.chars();
    let Some(engine_type) = chars.next() else {
        return Err(ClientError::Frame("empty frame".to_string()));
    };
    let rest = chars.as_str();

    match engine_type {
        '0' => Ok(Packet::Open(parse_json(rest).unwrap_or(Value::Null))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket_packet(rest),
        '5' | '6' => Ok(Packet::Ignored),
        other => Err(ClientError::Frame(format!(
            "unknown engine packet type '{other}'"
        ))),
    }
}

fn decode_socket_packet(packet: &str) -> Result<Packet, ClientError> {
    let mut chars = packet.chars();
    let Some(socket_type) = chars.next() else {
        return Err(ClientError::Frame("empty socket packet".to_string()));
    };
    let body = strip_ack_id(strip_namespace(chars.as_str()));

    match socket_type {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(body),
        '4' => {
            let message = parse_json(body)
                .and_then(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Object(map) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .unwrap_or_else(|| "connection refused".to_string());
            Ok(Packet::ConnectError(message))
        }
        '3' | '5' | '6' => Ok(Packet::Ignored),
        other => Err(ClientError::Frame(format!(
            "unknown socket packet type '{other}'"
        ))),
    }
}

fn decode_event(body: &str) -> Result<Packet, ClientError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClientError::Frame(format!("event body is not JSON: {e}")))?;
    let Value::Array(mut items) = value else {
        return Err(ClientError::Frame("event body is not an array".to_string()));
    };
    if items.is_empty() {
        return Err(ClientError::Frame("event without a name".to_string()));
    }
    let Value::String(name) = items.remove(0) else {
        return Err(ClientError::Frame("event name is not a string".to_string()));
    };
    let payload = if items.is_empty() {
        Value::Null
    } else {
        items.remove(0)
    };
    Ok(Packet::Event { name, payload })
}

fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.split_once(',') {
            Some((_, rest)) => rest,
            None => "",
        }
    } else {
        body
    }
}

fn strip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_json(body: &str) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

// ---------------------------------------------------------------------------
// Typed events
// ---------------------------------------------------------------------------

/// One `performance` payload. GPU fields are absent or `null` on machines
/// without a supported GPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PerformanceSample {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub ram_percent: Option<f64>,
    #[serde(default)]
    pub gpu_percent: Option<f64>,
    #[serde(default)]
    pub gpu_memory_percent: Option<f64>,
}

impl PerformanceSample {
    pub fn new(cpu: f64, ram: f64, gpu: f64, gpu_memory: f64) -> Self {
        Self {
            cpu_percent: Some(cpu),
            ram_percent: Some(ram),
            gpu_percent: Some(gpu),
            gpu_memory_percent: Some(gpu_memory),
        }
    }
}

/// What the dashboard reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connected,
    Disconnected,
    ConnectError(String),
    Performance(PerformanceSample),
}

/// Map a decoded packet to a dashboard event, if it is one.
pub fn interpret(packet: Packet) -> Result<Option<FeedEvent>, ClientError> {
    match packet {
        Packet::Connect => Ok(Some(FeedEvent::Connected)),
        Packet::Disconnect | Packet::Close => Ok(Some(FeedEvent::Disconnected)),
        Packet::ConnectError(message) => Ok(Some(FeedEvent::ConnectError(message))),
        Packet::Event { name, payload } if name == PERFORMANCE_EVENT => {
            let sample: PerformanceSample = serde_json::from_value(payload)
                .map_err(|e| ClientError::Frame(format!("bad performance payload: {e}")))?;
            Ok(Some(FeedEvent::Performance(sample)))
        }
        _ => Ok(None),
    }
}

/// Encode an event frame, as the server would send it.
pub fn encode_event(name: &str, payload: &Value) -> String {
    format!("42{}", Value::Array(vec![Value::String(name.to_string()), payload.clone()]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_engine_packets() {
        assert!(matches!(
            decode(r#"0{"sid":"abc","pingInterval":25000}"#).unwrap(),
            Packet::Open(v) if v["sid"] == "abc"
        ));
        assert_eq!(decode("1").unwrap(), Packet::Close);
        assert_eq!(decode("2").unwrap(), Packet::Ping);
        assert_eq!(decode("6").unwrap(), Packet::Ignored);
    }

    #[test]
    fn decodes_connect_with_and_without_body() {
        assert_eq!(decode("40").unwrap(), Packet::Connect);
        assert_eq!(decode(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Connect);
        assert_eq!(decode("41").unwrap(), Packet::Disconnect);
    }

    #[test]
    fn decodes_performance_event() {
        let frame = r#"42["performance",{"cpu_percent":12.5,"ram_percent":40,"gpu_percent":null}]"#;
        let event = interpret(decode(frame).unwrap()).unwrap().unwrap();
        assert_eq!(
            event,
            FeedEvent::Performance(PerformanceSample {
                cpu_percent: Some(12.5),
                ram_percent: Some(40.0),
                gpu_percent: None,
                gpu_memory_percent: None,
            })
        );
    }

    #[test]
    fn skips_namespace_and_ack_id() {
        let packet = decode(r#"42/monitor,17["performance",{}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "performance".to_string(),
                payload: json!({}),
            }
        );
    }

    #[test]
    fn connect_error_carries_message() {
        assert_eq!(
            decode(r#"44{"message":"Not authorized"}"#).unwrap(),
            Packet::ConnectError("Not authorized".to_string())
        );
        assert_eq!(
            decode("44").unwrap(),
            Packet::ConnectError("connection refused".to_string())
        );
    }

    #[test]
    fn other_events_are_ignored() {
        let packet = decode(r#"42["message",{"data":"Connected"}]"#).unwrap();
        assert_eq!(interpret(packet).unwrap(), None);
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(decode("").is_err());
        assert!(decode("9").is_err());
        assert!(decode("42not-json").is_err());
        assert!(decode(r#"42{"a":1}"#).is_err());
        assert!(decode("42[]").is_err());
        assert!(decode("42[5]").is_err());

        let bad_payload = decode(r#"42["performance","high"]"#).unwrap();
        assert!(interpret(bad_payload).is_err());
    }

    #[test]
    fn encode_event_round_trips_through_decode() {
        let frame = encode_event("performance", &json!({"cpu_percent": 1.0}));
        assert_eq!(frame, r#"42["performance",{"cpu_percent":1.0}]"#);
        assert!(matches!(decode(&frame).unwrap(), Packet::Event { .. }));
    }
}
