use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A training session as listed for the current user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// How the current user relates to a listed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Joined,
}

/// The sessions the current user owns or has joined.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionList {
    #[serde(default)]
    pub owned_sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub joined_sessions: Vec<SessionSummary>,
}

impl SessionList {
    /// Iterates over every session, owned ones first.
    pub fn iter(&self) -> impl Iterator<Item = (Ownership, &SessionSummary)> {
        let owned = self.owned_sessions.iter().map(|s| (Ownership::Owned, s));
        let joined = self.joined_sessions.iter().map(|s| (Ownership::Joined, s));
        owned.chain(joined)
    }

    pub fn len(&self) -> usize {
        self.owned_sessions.len() + self.joined_sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Overall status of a session.
///
/// Anything the backend reports other than `RUNNING` or `COMPLETED` is treated
/// as an offline, terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    Completed,
    #[serde(other)]
    Offline,
}

impl SessionStatus {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Offline => "OFFLINE",
        }
    }
}

/// The per-peer hyperparameters submitted when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub batch_size: u32,
    pub epochs: u32,
}

/// One reported training checkpoint of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Epoch {
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
}

/// Everything a session snapshot knows about a single peer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PeerData {
    #[serde(default)]
    pub hyperparameters: Option<Hyperparameters>,
    #[serde(default)]
    pub epochs: Vec<Epoch>,
}

/// A point-in-time snapshot of a session and all of its peers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FullResults {
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub peers: BTreeMap<String, PeerData>,
}

/// A single backend log line for a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    pub peer_id: String,
    pub log_level: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Coarse severity of a [`LogEntry`], derived from its free-form level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Success,
    Info,
}

impl LogEntry {
    pub fn level(&self) -> LogLevel {
        let level = self.log_level.to_uppercase();
        if level.contains("ERROR") {
            LogLevel::Error
        } else if level.contains("WARN") {
            LogLevel::Warning
        } else if level.contains("SUCCESS") {
            LogLevel::Success
        } else {
            LogLevel::Info
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct OnlinePeers {
    #[serde(default)]
    pub online_peers: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StartedSession {
    pub session_uid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Analysis {
    pub analysis: String,
}
