use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    path::PathBuf,
    time::Duration,
};

use api::{
    ApiError, Backend, StartSession,
    types::{Epoch, FullResults, LogEntry, PeerData, SessionList, SessionStatus},
};
use async_trait::async_trait;
use orchestrator::{
    Concern, Dashboard, DashboardError, IdleView, Joined, Phase,
    configs::{DashboardConfig, Role, SessionDraft},
};
use tokio::{runtime::Handle, time};

/// Canned backend state shared between a test and its dashboard.
#[derive(Default)]
struct Script {
    history: Mutex<Vec<&'static str>>,
    expired: AtomicBool,
    expiring: Mutex<HashSet<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    blank_session_id: AtomicBool,
    sessions_delay: Mutex<Duration>,
    status: Mutex<Option<SessionStatus>>,
    logs: Mutex<Vec<LogEntry>>,
    submitted: Mutex<Option<(usize, String)>>,
}

impl Script {
    fn hit(&self, endpoint: &'static str) -> api::Result<()> {
        self.history.lock().unwrap().push(endpoint);
        if self.expired.load(Ordering::SeqCst) || self.expiring.lock().unwrap().contains(endpoint) {
            return Err(ApiError::SessionExpired);
        }
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(ApiError::Decode(format!("{endpoint} is unavailable")));
        }
        Ok(())
    }

    fn calls(&self, endpoint: &str) -> usize {
        self.history.lock().unwrap().iter().filter(|e| **e == endpoint).count()
    }

    /// Endpoints hit since the `nth` call to `endpoint`, that call excluded.
    fn after(&self, endpoint: &str, nth: usize) -> Vec<&'static str> {
        let history = self.history.lock().unwrap();
        let idx = history
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == endpoint)
            .nth(nth - 1)
            .map(|(i, _)| i)
            .unwrap();
        history[idx + 1..].to_vec()
    }

    fn expire(&self, endpoint: &'static str) {
        self.expiring.lock().unwrap().insert(endpoint);
    }

    fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    fn set_status(&self, status: SessionStatus) {
        *self.status.lock().unwrap() = Some(status);
    }
}

#[derive(Clone, Default)]
struct FakeBackend(Arc<Script>);

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_sessions(&self) -> api::Result<SessionList> {
        self.0.hit("sessions")?;
        let delay = *self.0.sessions_delay.lock().unwrap();
        time::sleep(delay).await;
        Ok(serde_json::from_value(serde_json::json!({
            "owned_sessions": [{ "_id": "s-1", "status": "RUNNING" }],
            "joined_sessions": [{ "_id": "s-2", "status": "COMPLETED" }],
        }))
        .unwrap())
    }

    async fn join_network(&self) -> api::Result<()> {
        self.0.hit("join")
    }

    async fn leave_network(&self) -> api::Result<()> {
        self.0.hit("leave")
    }

    async fn start_session(&self, req: StartSession) -> api::Result<String> {
        self.0.hit("start")?;
        *self.0.submitted.lock().unwrap() = Some((req.num_peers(), req.hyperparameters_json()?));
        if self.0.blank_session_id.load(Ordering::SeqCst) {
            return Ok(String::new());
        }
        Ok("s-new".into())
    }

    async fn fetch_full_results(&self, session_id: &str) -> api::Result<FullResults> {
        self.0.hit("results")?;

        let status = self.0.status.lock().unwrap().unwrap_or(SessionStatus::Running);
        let mut peers = BTreeMap::new();
        peers.insert(
            "peer-a".to_string(),
            PeerData {
                hyperparameters: None,
                epochs: vec![
                    Epoch {
                        epoch: 1,
                        loss: 1.0,
                        accuracy: 0.5,
                    },
                    Epoch {
                        epoch: 2,
                        loss: 0.5,
                        accuracy: 0.7,
                    },
                ],
            },
        );

        Ok(FullResults {
            session_id: session_id.to_string(),
            status,
            peers,
        })
    }

    async fn online_peers(&self) -> api::Result<u64> {
        self.0.hit("online_peers")?;
        Ok(7)
    }

    async fn fetch_logs(&self, _session_id: &str) -> api::Result<Vec<LogEntry>> {
        self.0.hit("logs")?;
        Ok(self.0.logs.lock().unwrap().clone())
    }

    async fn analyze_results(&self, session_id: &str) -> api::Result<String> {
        self.0.hit("analyze")?;
        Ok(format!("### {session_id}\nlooks good"))
    }
}

fn setup(role: Role) -> (Dashboard<FakeBackend>, Arc<Script>) {
    let backend = FakeBackend::default();
    let script = backend.0.clone();
    let config = DashboardConfig::new(role, Some("token".into()));
    (Dashboard::new(backend, config, Handle::current()), script)
}

fn log_line(message: &str) -> LogEntry {
    LogEntry {
        peer_id: "peer-a".into(),
        log_level: "INFO".into(),
        message: message.into(),
        timestamp: None,
    }
}

async fn settle(ms: u64) {
    time::sleep(Duration::from_millis(ms)).await;
}

/// A valid two-peer draft pointing at a freshly written dataset.
fn csv_draft(tag: &str) -> (SessionDraft, PathBuf) {
    let path = std::env::temp_dir().join(format!("lifecycle-{tag}-{}.csv", std::process::id()));
    std::fs::write(&path, "x,y\n1,2\n").unwrap();

    let mut draft = SessionDraft::default();
    draft.dataset_path = path.to_string_lossy().into_owned();
    (draft, path)
}

#[tokio::test(start_paused = true)]
async fn trainer_joins_and_lists_sessions() {
    let (mut dashboard, script) = setup(Role::Trainer);
    assert_eq!(dashboard.active_timers(), vec![Concern::OnlinePeers]);

    let joined = dashboard.join_network().await.unwrap();
    assert_eq!(joined, Joined::Trainer);
    assert_eq!(dashboard.view().phase, Phase::Idle(IdleView::Sessions));
    assert_eq!(dashboard.view().sessions.len(), 2);
    assert_eq!(script.calls("sessions"), 1);

    settle(10).await;
    dashboard.tick();
    assert_eq!(dashboard.view().online_peers, 7);
}

#[tokio::test(start_paused = true)]
async fn online_peers_refresh_every_five_seconds() {
    let (_dashboard, script) = setup(Role::Trainer);

    settle(10).await;
    assert_eq!(script.calls("online_peers"), 1);

    settle(10_000).await;
    assert_eq!(script.calls("online_peers"), 3);
}

#[tokio::test(start_paused = true)]
async fn peer_counts_uptime_while_online() {
    let (mut dashboard, script) = setup(Role::Peer);
    assert!(dashboard.active_timers().is_empty());

    let joined = dashboard.join_network().await.unwrap();
    assert_eq!(joined, Joined::PeerConsole);
    assert_eq!(dashboard.active_timers(), vec![Concern::Uptime]);

    settle(3_500).await;
    dashboard.tick();
    assert_eq!(dashboard.view().uptime, Duration::from_secs(3));
    assert_eq!(script.calls("online_peers"), 0);

    dashboard.leave_network().await.unwrap();
    assert_eq!(dashboard.view().phase, Phase::Offline);
    assert_eq!(dashboard.view().uptime, Duration::ZERO);
    assert!(dashboard.active_timers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_join_stays_offline() {
    let (mut dashboard, script) = setup(Role::Trainer);
    script.fail("join");

    let res = dashboard.join_network().await;
    assert!(matches!(res, Err(DashboardError::Api(_))));
    assert_eq!(dashboard.view().phase, Phase::Offline);
    assert!(!dashboard.view().loading);
    assert!(dashboard.view().error.as_deref().unwrap().contains("join is unavailable"));

    dashboard.dismiss_error();
    assert_eq!(dashboard.view().error, None);
}

#[tokio::test(start_paused = true)]
async fn expired_action_logs_out() {
    let (mut dashboard, script) = setup(Role::Trainer);
    script.expired.store(true, Ordering::SeqCst);

    let res = dashboard.join_network().await;
    assert!(matches!(res, Err(DashboardError::SessionExpired)));
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
    assert!(dashboard.active_timers().is_empty());

    let res = dashboard.join_network().await;
    assert!(matches!(res, Err(DashboardError::InvalidTransition { .. })));
}

#[tokio::test(start_paused = true)]
async fn expired_poll_stops_every_timer() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();
    script.expire("results");

    settle(1_500).await;
    dashboard.tick();
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
    assert!(dashboard.active_timers().is_empty());
    assert!(dashboard.view().results.is_none());

    let peers = script.calls("online_peers");
    let logs = script.calls("logs");
    settle(20_000).await;
    dashboard.tick();
    assert_eq!(script.calls("online_peers"), peers);
    assert_eq!(script.calls("logs"), logs);
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
}

#[tokio::test(start_paused = true)]
async fn started_session_waits_before_fetching_results() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.show_create().unwrap();
    assert_eq!(dashboard.view().phase, Phase::Idle(IdleView::Create));

    let (draft, path) = csv_draft("start");
    let session_id = dashboard.start_session(&draft).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(session_id, "s-new");
    assert_eq!(
        dashboard.view().phase,
        Phase::Monitoring {
            session_id: "s-new".into()
        }
    );

    let (num_peers, hyperparameters) = script.submitted.lock().unwrap().clone().unwrap();
    assert_eq!(num_peers, 2);
    let hyperparameters: serde_json::Value = serde_json::from_str(&hyperparameters).unwrap();
    assert_eq!(hyperparameters.as_array().unwrap().len(), 2);

    settle(500).await;
    assert_eq!(script.calls("results"), 0);
    assert_eq!(script.calls("logs"), 1);

    settle(600).await;
    assert_eq!(script.calls("results"), 1);
    dashboard.tick();
    assert_eq!(dashboard.view().results.as_ref().unwrap().session_id, "s-new");
}

#[tokio::test(start_paused = true)]
async fn start_without_a_session_id_stays_idle() {
    let (mut dashboard, script) = setup(Role::Trainer);
    script.blank_session_id.store(true, Ordering::SeqCst);
    dashboard.join_network().await.unwrap();
    dashboard.show_create().unwrap();

    let (draft, path) = csv_draft("blank");
    let res = dashboard.start_session(&draft).await;
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(res, Err(DashboardError::Api(ApiError::Decode(_)))));
    assert_eq!(dashboard.view().phase, Phase::Idle(IdleView::Create));
    assert!(dashboard.view().error.is_some());

    settle(3_000).await;
    assert_eq!(script.calls("results"), 0);
    assert_eq!(script.calls("logs"), 0);
    assert_eq!(dashboard.active_timers(), vec![Concern::OnlinePeers]);
}

#[tokio::test(start_paused = true)]
async fn invalid_form_is_reported_before_sending() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();

    let res = dashboard.start_session(&SessionDraft::default()).await;
    assert!(matches!(res, Err(DashboardError::InvalidForm(_))));
    assert_eq!(script.calls("start"), 0);
    assert!(dashboard.view().error.is_some());
    assert_eq!(dashboard.view().phase, Phase::Idle(IdleView::Sessions));
}

#[tokio::test(start_paused = true)]
async fn running_session_keeps_polling() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    settle(3_500).await;
    dashboard.tick();
    assert_eq!(script.calls("results"), 4);
    assert_eq!(script.calls("logs"), 2);
    assert_eq!(
        dashboard.active_timers(),
        vec![Concern::OnlinePeers, Concern::Results, Concern::Logs]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_first_fetch_is_not_retried() {
    let (mut dashboard, script) = setup(Role::Trainer);
    script.fail("results");
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    settle(5_500).await;
    dashboard.tick();
    assert_eq!(script.calls("results"), 1);
    assert!(dashboard.view().error.as_deref().unwrap().contains("results is unavailable"));
    assert!(!dashboard.active_timers().contains(&Concern::Results));
    assert!(dashboard.active_timers().contains(&Concern::Logs));
}

#[tokio::test(start_paused = true)]
async fn running_session_outlives_a_failed_poll() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    settle(100).await;
    dashboard.tick();
    assert!(dashboard.view().results.is_some());

    script.fail("results");
    settle(2_000).await;
    dashboard.tick();
    assert_eq!(script.calls("results"), 3);
    assert!(dashboard.view().error.is_some());
    assert!(dashboard.active_timers().contains(&Concern::Results));

    script.failing.lock().unwrap().clear();
    settle(1_000).await;
    dashboard.tick();
    assert_eq!(script.calls("results"), 4);
    assert_eq!(dashboard.view().error, None);
}

#[tokio::test(start_paused = true)]
async fn completed_session_stops_results_polling() {
    let (mut dashboard, script) = setup(Role::Trainer);
    script.set_status(SessionStatus::Completed);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-2").unwrap();

    settle(100).await;
    dashboard.tick();
    assert_eq!(
        dashboard.view().results.as_ref().unwrap().status,
        SessionStatus::Completed
    );
    assert!(!dashboard.active_timers().contains(&Concern::Results));
    assert!(dashboard.active_timers().contains(&Concern::Logs));

    settle(5_000).await;
    assert_eq!(script.calls("results"), 1);
}

#[tokio::test(start_paused = true)]
async fn only_non_empty_logs_replace_the_previous_ones() {
    let (mut dashboard, script) = setup(Role::Trainer);
    *script.logs.lock().unwrap() = vec![log_line("epoch 1 done")];
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    settle(100).await;
    dashboard.tick();
    assert_eq!(dashboard.view().logs.len(), 1);

    script.logs.lock().unwrap().clear();
    settle(2_100).await;
    dashboard.tick();
    assert_eq!(dashboard.view().logs[0].message, "epoch 1 done");

    *script.logs.lock().unwrap() = vec![log_line("a"), log_line("b")];
    settle(2_000).await;
    dashboard.tick();
    assert_eq!(dashboard.view().logs.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn going_back_discards_the_monitored_session() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    settle(100).await;
    dashboard.tick();
    assert!(dashboard.view().results.is_some());

    // leave a few results queued up, then list slowly enough for any
    // surviving poll to fire while the list is in flight
    settle(1_500).await;
    *script.sessions_delay.lock().unwrap() = Duration::from_secs(3);
    dashboard.back_to_sessions().await.unwrap();
    dashboard.tick();

    let during = script.after("sessions", 2);
    assert!(!during.contains(&"results"), "{during:?}");
    assert!(!during.contains(&"logs"), "{during:?}");

    assert_eq!(dashboard.view().phase, Phase::Idle(IdleView::Sessions));
    assert!(dashboard.view().results.is_none());
    assert!(dashboard.view().logs.is_empty());
    assert_eq!(script.calls("sessions"), 2);
    assert_eq!(dashboard.active_timers(), vec![Concern::OnlinePeers]);

    let results = script.calls("results");
    settle(3_000).await;
    assert_eq!(script.calls("results"), results);
}

#[tokio::test(start_paused = true)]
async fn expired_log_poll_logs_out() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    settle(100).await;
    dashboard.tick();
    assert!(dashboard.view().phase.session_id().is_some());

    script.expire("logs");
    settle(2_000).await;
    dashboard.tick();
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
    assert!(dashboard.active_timers().is_empty());
    assert!(dashboard.view().results.is_none());
}

#[tokio::test(start_paused = true)]
async fn expired_online_peer_poll_logs_out() {
    let (mut dashboard, script) = setup(Role::Trainer);
    script.expire("online_peers");

    settle(10).await;
    dashboard.tick();
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
    assert!(dashboard.active_timers().is_empty());

    settle(10_000).await;
    assert_eq!(script.calls("online_peers"), 1);
}

#[tokio::test(start_paused = true)]
async fn analysis_needs_reported_epochs() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();

    let res = dashboard.request_analysis().await;
    assert!(matches!(res, Err(DashboardError::InvalidTransition { .. })));

    settle(100).await;
    dashboard.tick();
    let analysis = dashboard.request_analysis().await.unwrap();
    assert!(analysis.contains("looks good"));
    assert_eq!(dashboard.view().analysis.as_deref(), Some(analysis.as_str()));
    assert_eq!(script.calls("analyze"), 1);
}

#[tokio::test(start_paused = true)]
async fn offline_dashboard_rejects_session_actions() {
    let (mut dashboard, _) = setup(Role::Trainer);

    assert!(matches!(
        dashboard.view_session("s-1"),
        Err(DashboardError::InvalidTransition { .. })
    ));
    assert!(matches!(
        dashboard.leave_network().await,
        Err(DashboardError::InvalidTransition { .. })
    ));
    assert!(matches!(
        dashboard.back_to_sessions().await,
        Err(DashboardError::InvalidTransition { .. })
    ));
    assert!(matches!(
        dashboard.show_create(),
        Err(DashboardError::InvalidTransition { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn peers_cannot_create_sessions() {
    let (mut dashboard, script) = setup(Role::Peer);
    dashboard.join_network().await.unwrap();

    assert!(matches!(
        dashboard.show_create(),
        Err(DashboardError::Forbidden { .. })
    ));
    assert!(matches!(
        dashboard.start_session(&SessionDraft::default()).await,
        Err(DashboardError::Forbidden { .. })
    ));
    assert_eq!(script.calls("start"), 0);
}

#[tokio::test(start_paused = true)]
async fn logout_clears_everything() {
    let (mut dashboard, _) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();
    settle(100).await;
    dashboard.tick();

    dashboard.logout();
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
    assert!(dashboard.view().sessions.is_empty());
    assert!(dashboard.view().results.is_none());
    assert!(dashboard.active_timers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_monitoring_leaves_the_network() {
    let (mut dashboard, script) = setup(Role::Trainer);
    dashboard.join_network().await.unwrap();
    dashboard.view_session("s-1").unwrap();
    settle(100).await;
    dashboard.tick();

    dashboard.shutdown().await;
    assert_eq!(script.calls("leave"), 1);
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
    assert!(dashboard.active_timers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_offline_only_logs_out() {
    let (mut dashboard, script) = setup(Role::Peer);

    dashboard.shutdown().await;
    assert_eq!(script.calls("leave"), 0);
    assert_eq!(dashboard.view().phase, Phase::LoggedOut);
}
