//! Failure taxonomy shared by the editor, the log viewer, and the push channel.

use thiserror::Error;

/// Broad category of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never completed or the server answered non-2xx.
    Network,
    /// A payload could not be parsed or produced.
    Format,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error("'{value}' is not a valid number for {field}")]
    InvalidNumber { field: String, value: String },

    #[error("unknown form field '{0}'")]
    UnknownField(String),

    #[error("malformed push frame: {0}")]
    Frame(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::Status { .. } => ErrorKind::Network,
            Self::Decode { .. }
            | Self::Encode(_)
            | Self::InvalidNumber { .. }
            | Self::UnknownField(_)
            | Self::Frame(_) => ErrorKind::Format,
        }
    }
}
