//! Error types for the knowledge-base chat core.

use thiserror::Error;

use crate::conversation::TurnId;

/// Crate-wide error type.
///
/// Transport-side failures (`Transport`, `Decode`, `StreamRead`, `Cancelled`)
/// never reach the user directly: the conversation reducer turns them into a
/// fixed apology message. The remaining variants are caller mistakes.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-success HTTP status, connection failure or a missing response body.
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        /// HTTP status code, when a response was received at all.
        status: Option<u16>,
        /// Human readable detail.
        message: String,
    },

    /// Response body did not match the expected JSON or text shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Failure while pulling successive chunks from a streamed body.
    #[error("Stream read error: {0}")]
    StreamRead(String),

    /// The exchange was aborted through its cancellation token.
    #[error("Exchange cancelled")]
    Cancelled,

    /// A submit arrived while another exchange was still awaiting its response.
    #[error("An exchange is already in progress")]
    Busy,

    /// Submitted text was empty after trimming.
    #[error("Message is empty")]
    EmptyInput,

    /// The addressed turn is not the in-progress assistant placeholder.
    #[error("Turn {0} is not awaiting a response")]
    StaleTurn(TurnId),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration could not be assembled.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Whether this error came from talking to the knowledge-base service.
    #[must_use]
    pub fn is_transport_side(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Decode(_) | Self::StreamRead(_) | Self::Cancelled
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if err.is_body() {
            return Self::StreamRead(err.to_string());
        }
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_includes_status() {
        let err = Error::Transport {
            status: Some(503),
            message: "service unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Transport error (503): service unavailable"
        );

        let err = Error::Transport {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn classifies_transport_side_errors() {
        assert!(Error::Decode("bad".into()).is_transport_side());
        assert!(Error::StreamRead("reset".into()).is_transport_side());
        assert!(Error::Cancelled.is_transport_side());
        assert!(!Error::Busy.is_transport_side());
        assert!(!Error::EmptyInput.is_transport_side());
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
