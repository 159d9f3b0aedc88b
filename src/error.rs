use thiserror::Error;

use crate::api::classify;

pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;

/// Failure surfaced by any console operation.
///
/// Variants follow the order in which a request can fail: local validation,
/// token acquisition, the transport, and finally the server's own envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authorization(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    #[error("{0}")]
    Application(String),
}

impl ConsoleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn application(msg: impl Into<String>) -> Self {
        Self::Application(msg.into())
    }

    pub fn transport(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: msg.into(),
        }
    }

    /// Short text shown to the operator in a toast or error row.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Network(_) => {
                "Network error. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Only connectivity failures are retried automatically. A transport
    /// error without a status never got an answer from the server, so its
    /// text decides; anything the server answered is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConsoleError::Network(_) => true,
            ConsoleError::Transport {
                status: None,
                message,
            } => classify::looks_like_network_failure(message),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return ConsoleError::Network(err.to_string());
        }

        let status = err.status().map(|status| status.as_u16());
        ConsoleError::Transport {
            status,
            message: format!("Unexpected response from the server: {err}"),
        }
    }
}
