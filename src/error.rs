//! Error type for MISP client operations

use std::path::PathBuf;

use thiserror::Error;

use crate::response::Response;

/// Result type for MISP client operations
pub type Result<T> = std::result::Result<T, MispError>;

/// Errors reported by the MISP client
#[derive(Error, Debug)]
pub enum MispError {
    /// Scheme other than `http` or `https`
    #[error("unknown protocol {0:?}: only http and https protocols are allowed")]
    UnknownProtocol(String),

    #[error("invalid MISP URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection refused, timeout, DNS or TLS failure
    #[error("MISP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with anything but HTTP 200
    #[error("MISP ERROR (HTTP {status}) : {message}")]
    Remote { status: u16, message: String },

    /// The body of a 200 response did not match the expected envelope.
    /// `partial` holds the elements decoded before the mismatch.
    #[error("failed to decode MISP response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        partial: Box<Response>,
    },

    #[error("invalid MISP timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read configuration file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MispError {
    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            MispError::Remote { status, .. } => Some(*status),
            MispError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Best-effort response left behind by a decode failure
    pub fn partial_response(&self) -> Option<&Response> {
        match self {
            MispError::Decode { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Response to fall back on after a failed search: the partially decoded
    /// response for decode errors, `Response::Empty` otherwise.
    pub fn into_response(self) -> Response {
        match self {
            MispError::Decode { partial, .. } => *partial,
            _ => Response::Empty,
        }
    }
}
