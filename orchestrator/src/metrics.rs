use std::borrow::Cow;

use api::types::{Epoch, FullResults, PeerData, SessionStatus};

/// Epoch count assumed when a peer didn't report its hyperparameters.
pub const DEFAULT_PLANNED_EPOCHS: u32 = 10;

/// Whether accuracy went up or down between the first and last epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improvement,
    Decline,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::Decline => "decline",
        }
    }
}

/// Figures derived from a single peer's epochs.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSummary {
    /// The session runs but the peer hasn't reported anything yet.
    pub syncing: bool,
    pub latest: Option<Epoch>,
    pub avg_loss: f64,
    pub avg_accuracy: f64,
    /// Accuracy gained since the first epoch, in percentage points.
    pub improvement: f64,
    pub samples: usize,
    pub planned_epochs: u32,
}

impl PeerSummary {
    /// Summarizes a peer's reported epochs.
    ///
    /// # Arguments
    /// * `peer` - The peer's hyperparameters and epochs.
    /// * `status` - The status of the session the peer belongs to.
    ///
    /// # Returns
    /// The summary, with zeroed averages when nothing was reported.
    pub fn of(peer: &PeerData, status: SessionStatus) -> Self {
        let epochs = &peer.epochs;
        let samples = epochs.len();

        let mean = |f: fn(&Epoch) -> f64| {
            if samples == 0 {
                0.0
            } else {
                epochs.iter().map(f).sum::<f64>() / samples as f64
            }
        };

        let improvement = match (epochs.first(), epochs.last()) {
            (Some(first), Some(last)) if samples > 1 => (last.accuracy - first.accuracy) * 100.0,
            _ => 0.0,
        };

        Self {
            syncing: samples == 0 && status.is_running(),
            latest: epochs.last().copied(),
            avg_loss: mean(|e: &Epoch| e.loss),
            avg_accuracy: mean(|e: &Epoch| e.accuracy),
            improvement,
            samples,
            planned_epochs: peer
                .hyperparameters
                .map(|h| h.epochs)
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PLANNED_EPOCHS),
        }
    }

    /// The direction of the accuracy change, only defined with two epochs or
    /// more and an accuracy that actually moved.
    pub fn trend(&self) -> Option<Trend> {
        if self.samples < 2 || self.improvement == 0.0 {
            return None;
        }

        Some(if self.improvement > 0.0 {
            Trend::Improvement
        } else {
            Trend::Decline
        })
    }

    /// Fraction of the planned epochs already reported, within `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let done = self.latest.map_or(0, |e| e.epoch);
        (done as f64 / self.planned_epochs as f64).clamp(0.0, 1.0)
    }
}

/// Figures derived from a whole session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOverview {
    pub total_peers: usize,
    /// Peers that reported something, or every peer while the session runs.
    pub online_peers: usize,
    pub has_results: bool,
    pub running: bool,
}

impl SessionOverview {
    pub fn of(results: &FullResults) -> Self {
        let running = results.status.is_running();
        let reporting = results.peers.values().filter(|p| !p.epochs.is_empty()).count();

        Self {
            total_peers: results.peers.len(),
            online_peers: if running { results.peers.len() } else { reporting },
            has_results: reporting > 0,
            running,
        }
    }
}

/// Shortens long peer ids to `head...tail` characters.
///
/// # Arguments
/// * `id` - The full id.
/// * `limit` - Ids up to this many characters are returned unchanged.
/// * `head` - Characters kept from the start.
/// * `tail` - Characters kept from the end.
pub fn display_id(id: &str, limit: usize, head: usize, tail: usize) -> Cow<'_, str> {
    let len = id.chars().count();
    if len <= limit || head + tail >= len {
        return Cow::Borrowed(id);
    }

    let start: String = id.chars().take(head).collect();
    let end: String = id.chars().skip(len - tail).collect();
    Cow::Owned(format!("{start}...{end}"))
}

/// Formats seconds as `HH:MM:SS`.
pub fn format_uptime(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use api::types::Hyperparameters;

    use super::*;

    const EPS: f64 = 1e-9;

    fn epoch(epoch: u32, loss: f64, accuracy: f64) -> Epoch {
        Epoch {
            epoch,
            loss,
            accuracy,
        }
    }

    fn peer(epochs: Vec<Epoch>) -> PeerData {
        PeerData {
            hyperparameters: None,
            epochs,
        }
    }

    #[test]
    fn empty_running_peer_is_syncing() {
        let summary = PeerSummary::of(&peer(Vec::new()), SessionStatus::Running);
        assert!(summary.syncing);
        assert_eq!(summary.latest, None);
        assert_eq!(summary.avg_loss, 0.0);
        assert_eq!(summary.avg_accuracy, 0.0);
        assert_eq!(summary.improvement, 0.0);
        assert_eq!(summary.trend(), None);
    }

    #[test]
    fn empty_finished_peer_is_not_syncing() {
        let summary = PeerSummary::of(&peer(Vec::new()), SessionStatus::Completed);
        assert!(!summary.syncing);
    }

    #[test]
    fn latest_is_the_last_epoch() {
        let epochs = vec![epoch(1, 2.0, 0.1), epoch(2, 1.25, 0.3), epoch(3, 0.875, 0.45)];
        let summary = PeerSummary::of(&peer(epochs), SessionStatus::Running);
        assert!(!summary.syncing);
        assert_eq!(summary.latest, Some(epoch(3, 0.875, 0.45)));
    }

    #[test]
    fn averages_over_all_epochs() {
        let epochs = vec![epoch(1, 1.0, 0.5), epoch(2, 0.5, 0.7)];
        let summary = PeerSummary::of(&peer(epochs), SessionStatus::Completed);
        assert!((summary.avg_loss - 0.75).abs() < EPS);
        assert!((summary.avg_accuracy - 0.6).abs() < EPS);
    }

    #[test]
    fn improvement_in_percentage_points() {
        let epochs = vec![epoch(1, 1.0, 0.5), epoch(2, 0.5, 0.7)];
        let summary = PeerSummary::of(&peer(epochs), SessionStatus::Completed);
        assert!((summary.improvement - 20.0).abs() < EPS);
        assert_eq!(summary.trend(), Some(Trend::Improvement));
        assert_eq!(Trend::Improvement.label(), "improvement");
    }

    #[test]
    fn lost_accuracy_is_a_decline() {
        let epochs = vec![epoch(1, 0.4, 0.8), epoch(2, 0.6, 0.7)];
        let summary = PeerSummary::of(&peer(epochs), SessionStatus::Running);
        assert!(summary.improvement < 0.0);
        assert_eq!(summary.trend(), Some(Trend::Decline));
    }

    #[test]
    fn flat_accuracy_has_no_trend() {
        let epochs = vec![epoch(1, 0.9, 0.7), epoch(2, 0.8, 0.7)];
        let summary = PeerSummary::of(&peer(epochs), SessionStatus::Running);
        assert_eq!(summary.improvement, 0.0);
        assert_eq!(summary.trend(), None);
    }

    #[test]
    fn single_epoch_has_no_improvement() {
        let summary = PeerSummary::of(&peer(vec![epoch(1, 0.3, 0.9)]), SessionStatus::Running);
        assert_eq!(summary.improvement, 0.0);
        assert_eq!(summary.trend(), None);
    }

    #[test]
    fn progress_uses_planned_epochs() {
        let mut data = peer(vec![epoch(1, 1.0, 0.1), epoch(2, 0.9, 0.2)]);
        assert!((PeerSummary::of(&data, SessionStatus::Running).progress() - 0.2).abs() < EPS);

        data.hyperparameters = Some(Hyperparameters {
            learning_rate: 0.1,
            batch_size: 8,
            epochs: 4,
        });
        assert!((PeerSummary::of(&data, SessionStatus::Running).progress() - 0.5).abs() < EPS);

        data.epochs.push(epoch(9, 0.1, 0.9));
        assert_eq!(PeerSummary::of(&data, SessionStatus::Running).progress(), 1.0);
    }

    #[test]
    fn overview_counts_reporting_peers() {
        let mut peers = BTreeMap::new();
        peers.insert("a".to_string(), peer(vec![epoch(1, 1.0, 0.1)]));
        peers.insert("b".to_string(), peer(Vec::new()));

        let mut results = FullResults {
            session_id: "s".into(),
            status: SessionStatus::Completed,
            peers,
        };

        let overview = SessionOverview::of(&results);
        assert_eq!(overview.total_peers, 2);
        assert_eq!(overview.online_peers, 1);
        assert!(overview.has_results);

        results.status = SessionStatus::Running;
        assert_eq!(SessionOverview::of(&results).online_peers, 2);
    }

    #[test]
    fn long_ids_are_shortened() {
        assert_eq!(display_id("short", 16, 5, 6), "short");
        assert_eq!(
            display_id("0123456789abcdefghij", 16, 5, 6),
            "01234...efghij"
        );
        assert_eq!(
            display_id("0123456789abcdefghijk", 20, 8, 8),
            "01234567...defghijk"
        );
    }

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(0), "00:00:00");
        assert_eq!(format_uptime(3_725), "01:02:05");
    }
}
