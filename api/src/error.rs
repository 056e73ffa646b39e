use std::{error::Error, fmt};

use reqwest::StatusCode;

/// The api module's result type.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Every way a backend call can fail.
///
/// `SessionExpired` is fatal to the current view, the rest are recoverable
/// and only meant to be displayed.
#[derive(Debug)]
pub enum ApiError {
    /// The bearer token is missing or was rejected.
    SessionExpired,
    /// The backend answered with a non-success status.
    Http { status: StatusCode, message: String },
    /// The request never got a response.
    Transport(reqwest::Error),
    /// The response body was not what the endpoint promises.
    Decode(String),
    /// The request could not be built from the caller's input.
    InvalidRequest(String),
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Maps a non-success response to an error.
    ///
    /// # Arguments
    /// * `status` - The response status code.
    /// * `body` - The raw response body, possibly empty.
    ///
    /// # Returns
    /// `SessionExpired` for authentication failures, an `Http` error otherwise.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Self::SessionExpired;
        }

        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|val| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|key| val[*key].as_str().map(str::to_string))
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Self::Http { status, message }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => write!(f, "SESSION_EXPIRED"),
            Self::Http { status, message } => write!(f, "{message} (HTTP {})", status.as_u16()),
            Self::Transport(e) => write!(f, "cannot reach backend: {e}"),
            Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
