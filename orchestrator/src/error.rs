use std::fmt;

use api::ApiError;

/// All errors that can occur while driving the dashboard.
#[derive(Debug)]
pub enum DashboardError {
    /// The backend no longer accepts our credentials, the dashboard has logged out.
    SessionExpired,
    /// A recoverable backend failure, shown to the user.
    Api(ApiError),
    /// The action isn't available in the current phase.
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    /// The action isn't available to the current role.
    Forbidden {
        action: &'static str,
        role: &'static str,
    },
    /// The session form holds invalid values, caught before submitting.
    InvalidForm(String),
}

impl DashboardError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => write!(f, "session expired, please log in again"),
            Self::Api(e) => write!(f, "{e}"),
            Self::InvalidTransition { action, phase } => {
                write!(f, "cannot {action} while {phase}")
            }
            Self::Forbidden { action, role } => write!(f, "a {role} cannot {action}"),
            Self::InvalidForm(msg) => write!(f, "invalid session form: {msg}"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApiError> for DashboardError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::SessionExpired => Self::SessionExpired,
            other => Self::Api(other),
        }
    }
}
