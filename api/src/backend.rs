use async_trait::async_trait;

use crate::{
    Result, StartSession,
    types::{FullResults, LogEntry, SessionList},
};

/// The remote operations the dashboard depends on.
///
/// Every method either resolves with its payload or fails with an
/// [`ApiError`](crate::ApiError); none of them retry.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Lists the sessions the current user owns or has joined.
    async fn fetch_sessions(&self) -> Result<SessionList>;

    /// Marks the current user as online in the compute network.
    async fn join_network(&self) -> Result<()>;

    /// Marks the current user as offline.
    async fn leave_network(&self) -> Result<()>;

    /// Submits a new training session.
    ///
    /// # Returns
    /// The identifier of the created session.
    async fn start_session(&self, req: StartSession) -> Result<String>;

    /// Fetches a full snapshot of a session's results.
    async fn fetch_full_results(&self, session_id: &str) -> Result<FullResults>;

    /// Counts the peers currently online in the whole network.
    async fn online_peers(&self) -> Result<u64>;

    /// Fetches the log entries recorded so far for a session.
    async fn fetch_logs(&self, session_id: &str) -> Result<Vec<LogEntry>>;

    /// Asks the backend for a written analysis of a session's results.
    async fn analyze_results(&self, session_id: &str) -> Result<String>;
}
