//! Blocking WebSocket reader for the push channel.
//!
//! [`PushChannel::run`] owns the socket on its own thread. It answers the
//! Engine.IO handshake and pings itself and forwards everything the dashboard
//! cares about as [`FeedEvent`]s. When the connection drops it waits
//! `reconnect_delay` and dials again, until the receiving side hangs up or
//! the stop flag is raised.

use std::io::ErrorKind as IoErrorKind;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::protocol::{self, FeedEvent, Packet};
use crate::client::ClientError;
use crate::diagnostics;
use crate::settings::schema::ServerSettings;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Granularity at which the reader notices the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct PushChannel {
    url: String,
    reconnect_delay: Duration,
}

/// How a single connection ended.
enum SessionEnd {
    /// Remote closed or the transport failed; try again.
    Dropped,
    /// Stop flag raised or nobody is listening anymore.
    Shutdown,
}

impl PushChannel {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
        }
    }

    pub fn from_settings(server: &ServerSettings) -> Self {
        Self::new(
            server.socket_url(),
            Duration::from_millis(server.reconnect_delay_ms),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read the channel until `stop` is raised or `tx` is disconnected.
    ///
    /// Events are converted into the receiver's event type so the feed can
    /// share a channel with other producers.
    pub fn run<T: From<FeedEvent>>(&self, tx: &Sender<T>, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            let mut connected = false;
            let end = match self.connect() {
                Ok(mut socket) => {
                    let end = self.pump(&mut socket, tx, stop, &mut connected);
                    let _ = socket.close(None);
                    end
                }
                Err(e) => {
                    diagnostics::warn("feed", &e.to_string());
                    if tx.send(FeedEvent::ConnectError(e.to_string()).into()).is_err() {
                        SessionEnd::Shutdown
                    } else {
                        SessionEnd::Dropped
                    }
                }
            };

            if connected && tx.send(FeedEvent::Disconnected.into()).is_err() {
                return;
            }
            if matches!(end, SessionEnd::Shutdown) {
                return;
            }
            self.wait_before_reconnect(stop);
        }
    }

    /// Connect once and wait for the namespace handshake to finish.
    pub fn probe(&self, timeout: Duration) -> Result<(), ClientError> {
        let mut socket = self.connect()?;
        let deadline = Instant::now() + timeout;
        let result = loop {
            if Instant::now() >= deadline {
                break Err(self.transport_error("timed out waiting for handshake"));
            }
            match self.read_frame(&mut socket) {
                Ok(Some(frame)) => match protocol::decode(&frame)? {
                    Packet::Open(_) => self.send(&mut socket, protocol::CONNECT_FRAME)?,
                    Packet::Ping => self.send(&mut socket, protocol::PONG_FRAME)?,
                    Packet::Connect => break Ok(()),
                    Packet::ConnectError(message) => break Err(self.transport_error(&message)),
                    Packet::Close | Packet::Disconnect => {
                        break Err(self.transport_error("closed during handshake"));
                    }
                    _ => {}
                },
                Ok(None) => {}
                Err(e) => break Err(e),
            }
        };
        let _ = socket.close(None);
        result
    }

    fn connect(&self) -> Result<Socket, ClientError> {
        let (mut socket, _response) =
            tungstenite::connect(self.url.as_str()).map_err(|e| self.transport_error(&e.to_string()))?;
        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            stream
                .set_read_timeout(Some(POLL_INTERVAL))
                .map_err(|e| self.transport_error(&e.to_string()))?;
        }
        Ok(socket)
    }

    fn pump<T: From<FeedEvent>>(
        &self,
        socket: &mut Socket,
        tx: &Sender<T>,
        stop: &AtomicBool,
        connected: &mut bool,
    ) -> SessionEnd {
        loop {
            if stop.load(Ordering::Relaxed) {
                return SessionEnd::Shutdown;
            }
            let frame = match self.read_frame(socket) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    diagnostics::warn("feed", &e.to_string());
                    return SessionEnd::Dropped;
                }
            };

            let packet = match protocol::decode(&frame) {
                Ok(packet) => packet,
                Err(e) => {
                    diagnostics::warn("feed", &e.to_string());
                    continue;
                }
            };

            match packet {
                Packet::Open(_) => {
                    if self.send(socket, protocol::CONNECT_FRAME).is_err() {
                        return SessionEnd::Dropped;
                    }
                    continue;
                }
                Packet::Ping => {
                    if self.send(socket, protocol::PONG_FRAME).is_err() {
                        return SessionEnd::Dropped;
                    }
                    continue;
                }
                _ => {}
            }

            let closing = matches!(packet, Packet::Close | Packet::Disconnect);
            match protocol::interpret(packet) {
                Ok(Some(FeedEvent::Disconnected)) => {}
                Ok(Some(event)) => {
                    if matches!(event, FeedEvent::Connected) {
                        *connected = true;
                    }
                    if tx.send(event.into()).is_err() {
                        return SessionEnd::Shutdown;
                    }
                }
                Ok(None) => {}
                Err(e) => diagnostics::warn("feed", &e.to_string()),
            }
            if closing {
                return SessionEnd::Dropped;
            }
        }
    }

    /// Next text frame, `None` on a read timeout or a non-text message.
    fn read_frame(&self, socket: &mut Socket) -> Result<Option<String>, ClientError> {
        match socket.read() {
            Ok(Message::Text(text)) => Ok(Some(text)),
            Ok(Message::Close(_)) => Err(self.transport_error("connection closed")),
            Ok(_) => Ok(None),
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), IoErrorKind::TimedOut | IoErrorKind::WouldBlock) =>
            {
                Ok(None)
            }
            Err(e) => Err(self.transport_error(&e.to_string())),
        }
    }

    fn send(&self, socket: &mut Socket, frame: &str) -> Result<(), ClientError> {
        socket
            .send(Message::Text(frame.to_string()))
            .map_err(|e| self.transport_error(&e.to_string()))
    }

    fn wait_before_reconnect(&self, stop: &AtomicBool) {
        let deadline = Instant::now() + self.reconnect_delay;
        while Instant::now() < deadline {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(POLL_INTERVAL.min(self.reconnect_delay));
        }
    }

    fn transport_error(&self, message: &str) -> ClientError {
        ClientError::Transport {
            url: self.url.clone(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_builds_socket_url() {
        let server = ServerSettings {
            base_url: "http://127.0.0.1:5000".to_string(),
            reconnect_delay_ms: 250,
            ..ServerSettings::default()
        };
        let channel = PushChannel::from_settings(&server);
        assert_eq!(
            channel.url(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(channel.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn unreachable_server_reports_connect_error_and_stops_when_receiver_drops() {
        let channel = PushChannel::new(
            "ws://127.0.0.1:9/socket.io/?EIO=4&transport=websocket",
            Duration::from_millis(10),
        );
        let (tx, rx) = std::sync::mpsc::channel::<FeedEvent>();
        let stop = AtomicBool::new(false);

        let handle = std::thread::spawn(move || {
            let event = rx.recv().unwrap();
            drop(rx);
            event
        });
        channel.run(&tx, &stop);

        assert!(matches!(handle.join().unwrap(), FeedEvent::ConnectError(_)));
    }
}
