use std::{fmt, str::FromStr, time::Duration};

use super::Palette;

/// The role the current user plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creates sessions and watches their progress.
    Trainer,
    /// Contributes compute to other people's sessions.
    Peer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trainer => "trainer",
            Self::Peer => "peer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trainer" => Ok(Self::Trainer),
            "peer" => Ok(Self::Peer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// How often each background concern refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub uptime: Duration,
    pub online_peers: Duration,
    pub results: Duration,
    pub logs: Duration,
    /// Delay before the first results fetch of a freshly started session,
    /// the backend needs it to set up the peers.
    pub start_grace: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            uptime: Duration::from_secs(1),
            online_peers: Duration::from_secs(5),
            results: Duration::from_secs(1),
            logs: Duration::from_secs(2),
            start_grace: Duration::from_secs(1),
        }
    }
}

/// Everything the dashboard needs to know about its environment.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub token: Option<String>,
    pub role: Role,
    pub request_timeout: Option<Duration>,
    pub intervals: PollIntervals,
    pub palette: Palette,
}

impl DashboardConfig {
    /// Creates a configuration with default endpoints and intervals.
    ///
    /// # Arguments
    /// * `role` - The role of the current user.
    /// * `token` - The bearer token, if logged in.
    ///
    /// # Returns
    /// A new `DashboardConfig`.
    pub fn new(role: Role, token: Option<String>) -> Self {
        Self {
            api_base_url: api::DEFAULT_BASE_URL.to_string(),
            token,
            role,
            request_timeout: None,
            intervals: PollIntervals::default(),
            palette: Palette::default(),
        }
    }
}
