use std::{sync::Arc, time::Duration};

use api::{
    ApiError, Backend,
    types::{FullResults, LogEntry, SessionList},
};
use log::{error, info, warn};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, Receiver, Sender},
};

use crate::{
    Concern, DashboardError,
    configs::{DashboardConfig, Role, SessionDraft},
    polling::{self, Poller},
};

const EVENTS_CAPACITY: usize = 64;

/// Tabs available while online and not monitoring a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleView {
    Sessions,
    Create,
}

/// Where the dashboard currently is in the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Offline,
    Idle(IdleView),
    Monitoring { session_id: String },
    /// Terminal, reached once the backend rejects our credentials or on logout.
    LoggedOut,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Idle(_) => "online",
            Self::Monitoring { .. } => "monitoring a session",
            Self::LoggedOut => "logged out",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Idle(_) | Self::Monitoring { .. })
    }

    /// The id of the monitored session, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Monitoring { session_id } => Some(session_id),
            _ => None,
        }
    }
}

/// What the caller should do after joining the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joined {
    /// Stay on the dashboard, sessions are listed.
    Trainer,
    /// Switch to the peer console.
    PeerConsole,
}

/// Results of the background polls, applied on the next [`Dashboard::tick`].
#[derive(Debug)]
pub enum DashboardEvent {
    UptimeTick,
    OnlinePeers(u64),
    Results {
        session_id: String,
        results: FullResults,
    },
    Logs {
        session_id: String,
        entries: Vec<LogEntry>,
    },
    Failed {
        concern: Concern,
        message: String,
    },
    Expired,
}

/// Full snapshot rendered by the UI.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub role: Role,
    pub phase: Phase,
    pub sessions: SessionList,
    pub results: Option<FullResults>,
    pub logs: Vec<LogEntry>,
    pub analysis: Option<String>,
    pub online_peers: u64,
    pub uptime: Duration,
    pub loading: bool,
    pub error: Option<String>,
}

impl DashboardView {
    fn new(role: Role) -> Self {
        Self {
            role,
            phase: Phase::Offline,
            sessions: SessionList::default(),
            results: None,
            logs: Vec::new(),
            analysis: None,
            online_peers: 0,
            uptime: Duration::ZERO,
            loading: false,
            error: None,
        }
    }

    fn clear_monitoring(&mut self) {
        self.results = None;
        self.logs.clear();
        self.analysis = None;
    }
}

/// Drives the session lifecycle against a [`Backend`].
///
/// One-shot actions are awaited directly, recurring refreshes run as
/// background tasks whose results are applied by [`Dashboard::tick`].
pub struct Dashboard<B: Backend> {
    backend: Arc<B>,
    config: DashboardConfig,
    view: DashboardView,
    poller: Poller,
    events_tx: Sender<DashboardEvent>,
    events: Receiver<DashboardEvent>,
}

impl<B: Backend> Dashboard<B> {
    /// Creates a new `Dashboard` in the offline phase.
    ///
    /// # Arguments
    /// * `backend` - The remote api.
    /// * `config` - Role, intervals and the rest of the environment.
    /// * `runtime` - Where the background polls are spawned.
    ///
    /// # Returns
    /// A new `Dashboard`, already polling the online peer count for trainers.
    pub fn new(backend: B, config: DashboardConfig, runtime: Handle) -> Self {
        let (events_tx, events) = mpsc::channel(EVENTS_CAPACITY);

        let mut dashboard = Self {
            backend: Arc::new(backend),
            view: DashboardView::new(config.role),
            config,
            poller: Poller::new(runtime),
            events_tx,
            events,
        };

        dashboard.reconcile_timers();
        dashboard
    }

    /// Returns the current snapshot for rendering.
    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Returns the concerns that currently have a live background task.
    pub fn active_timers(&self) -> Vec<Concern> {
        self.poller.active()
    }

    pub fn dismiss_error(&mut self) {
        self.view.error = None;
    }

    /// Drains all pending poll results and updates state. Non-blocking.
    ///
    /// Should be called once per UI frame tick.
    pub fn tick(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    /// Goes online.
    ///
    /// # Returns
    /// Where the caller should navigate next, depending on the role.
    ///
    /// # Errors
    /// `InvalidTransition` unless offline, `SessionExpired` after logging out,
    /// `Api` for any other failure, leaving the phase untouched.
    pub async fn join_network(&mut self) -> Result<Joined, DashboardError> {
        self.ensure(matches!(self.view.phase, Phase::Offline), "join the network")?;
        self.view.loading = true;
        self.view.error = None;

        let joined = self.backend.join_network().await;
        self.view.loading = false;
        if let Err(e) = joined {
            return Err(self.fail(e));
        }

        info!("joined the network as {}", self.config.role);
        self.view.phase = Phase::Idle(IdleView::Sessions);
        self.reconcile_timers();
        self.refresh_sessions().await?;

        Ok(match self.config.role {
            Role::Trainer => Joined::Trainer,
            Role::Peer => Joined::PeerConsole,
        })
    }

    /// Goes offline.
    ///
    /// # Errors
    /// `InvalidTransition` unless online and idle, otherwise as [`Self::join_network`].
    pub async fn leave_network(&mut self) -> Result<(), DashboardError> {
        self.ensure(matches!(self.view.phase, Phase::Idle(_)), "leave the network")?;
        self.view.loading = true;

        let left = self.backend.leave_network().await;
        self.view.loading = false;
        if let Err(e) = left {
            return Err(self.fail(e));
        }

        info!("left the network");
        self.view.phase = Phase::Offline;
        self.reconcile_timers();
        Ok(())
    }

    /// Switches to the session list and refreshes it.
    ///
    /// # Errors
    /// `InvalidTransition` while monitoring or logged out.
    pub async fn show_sessions(&mut self) -> Result<(), DashboardError> {
        match self.view.phase {
            Phase::Idle(_) => self.view.phase = Phase::Idle(IdleView::Sessions),
            Phase::Offline => {}
            _ => return Err(self.invalid("list sessions")),
        }
        self.refresh_sessions().await
    }

    /// Switches to the session form.
    ///
    /// # Errors
    /// `Forbidden` for peers, `InvalidTransition` unless online and idle.
    pub fn show_create(&mut self) -> Result<(), DashboardError> {
        self.expect_trainer("create sessions")?;
        self.ensure(matches!(self.view.phase, Phase::Idle(_)), "create sessions")?;
        self.view.phase = Phase::Idle(IdleView::Create);
        Ok(())
    }

    /// Re-lists the sessions of the current user.
    ///
    /// Failures other than an expired session are only logged.
    ///
    /// # Errors
    /// `SessionExpired` after logging out, `InvalidTransition` once logged out.
    pub async fn refresh_sessions(&mut self) -> Result<(), DashboardError> {
        self.ensure(self.view.phase != Phase::LoggedOut, "list sessions")?;

        match self.backend.fetch_sessions().await {
            Ok(sessions) => {
                self.view.sessions = sessions;
                Ok(())
            }
            Err(e) if e.is_session_expired() => Err(self.fail(e)),
            Err(e) => {
                warn!("failed to fetch sessions: {e}");
                Ok(())
            }
        }
    }

    /// Submits a new session and starts monitoring it.
    ///
    /// The first results fetch waits for the configured grace period. A
    /// response without a session id leaves the dashboard idle.
    ///
    /// # Errors
    /// `Forbidden` for peers, `InvalidTransition` unless online and idle,
    /// `InvalidForm` before anything is sent, otherwise as [`Self::join_network`].
    pub async fn start_session(&mut self, draft: &SessionDraft) -> Result<String, DashboardError> {
        self.expect_trainer("start sessions")?;
        self.ensure(matches!(self.view.phase, Phase::Idle(_)), "start a session")?;
        self.view.error = None;

        let req = match draft.to_request() {
            Ok(req) => req,
            Err(e) => {
                self.view.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.view.loading = true;
        let started = self.backend.start_session(req).await;
        self.view.loading = false;

        let session_id = match started {
            Ok(id) if !id.trim().is_empty() => id,
            Ok(_) => {
                let e = ApiError::Decode("the backend returned no session id".into());
                return Err(self.fail(e));
            }
            Err(e) => return Err(self.fail(e)),
        };

        info!("started session {session_id}");
        let grace = self.config.intervals.start_grace;
        self.monitor(session_id.clone(), grace);
        Ok(session_id)
    }

    /// Starts monitoring an existing session, fetching its results right away.
    ///
    /// # Errors
    /// `InvalidTransition` unless online and idle.
    pub fn view_session(&mut self, session_id: &str) -> Result<(), DashboardError> {
        self.ensure(matches!(self.view.phase, Phase::Idle(_)), "view a session")?;
        info!("monitoring session {session_id}");
        self.monitor(session_id.to_string(), Duration::ZERO);
        Ok(())
    }

    /// Stops monitoring and returns to the session list.
    ///
    /// # Errors
    /// `InvalidTransition` unless monitoring, `SessionExpired` if re-listing
    /// finds the session expired.
    pub async fn back_to_sessions(&mut self) -> Result<(), DashboardError> {
        self.ensure(
            matches!(self.view.phase, Phase::Monitoring { .. }),
            "go back to the sessions",
        )?;

        self.poller.stop(Concern::Results);
        self.poller.stop(Concern::Logs);
        self.view.clear_monitoring();
        self.view.error = None;
        self.view.phase = Phase::Idle(IdleView::Sessions);
        self.reconcile_timers();

        self.refresh_sessions().await
    }

    /// Asks the backend to analyse the monitored session.
    ///
    /// # Returns
    /// The analysis text, also kept in the view.
    ///
    /// # Errors
    /// `InvalidTransition` unless monitoring a session that reported epochs,
    /// otherwise as [`Self::join_network`].
    pub async fn request_analysis(&mut self) -> Result<String, DashboardError> {
        let has_results = self
            .view
            .results
            .as_ref()
            .is_some_and(|r| r.peers.values().any(|p| !p.epochs.is_empty()));
        let session_id = match (&self.view.phase, has_results) {
            (Phase::Monitoring { session_id }, true) => session_id.clone(),
            _ => return Err(self.invalid("analyse results")),
        };

        self.view.loading = true;
        self.view.error = None;
        let analysis = self.backend.analyze_results(&session_id).await;
        self.view.loading = false;

        match analysis {
            Ok(text) => {
                self.view.analysis = Some(text.clone());
                Ok(text)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Leaves the network if still online, then logs out.
    ///
    /// Works from any online phase, monitoring included. Failing to leave is
    /// only logged, the dashboard ends logged out either way.
    pub async fn shutdown(&mut self) {
        if self.view.phase.is_online() {
            self.poller.stop(Concern::Results);
            self.poller.stop(Concern::Logs);

            match self.backend.leave_network().await {
                Ok(()) => info!("left the network"),
                Err(e) => warn!("cannot leave the network: {e}"),
            }
        }
        self.logout();
    }

    /// Stops every background task and ends the dashboard's lifecycle.
    pub fn logout(&mut self) {
        info!("logging out");
        self.poller.stop_all();
        self.view.phase = Phase::LoggedOut;
        self.view.clear_monitoring();
        self.view.sessions = SessionList::default();
        self.view.uptime = Duration::ZERO;
        self.view.loading = false;
    }

    fn monitor(&mut self, session_id: String, first_fetch: Duration) {
        self.view.clear_monitoring();
        self.view.phase = Phase::Monitoring {
            session_id: session_id.clone(),
        };

        let task = polling::results(
            self.backend.clone(),
            session_id,
            first_fetch,
            self.config.intervals.results,
            self.events_tx.clone(),
        );
        self.poller.restart(Concern::Results, task);
        self.reconcile_timers();
    }

    fn apply(&mut self, event: DashboardEvent) {
        if self.view.phase == Phase::LoggedOut {
            return;
        }

        match event {
            DashboardEvent::Expired => {
                error!("session expired while polling");
                self.logout();
            }

            DashboardEvent::UptimeTick => {
                if self.config.role == Role::Peer && self.view.phase.is_online() {
                    self.view.uptime += self.config.intervals.uptime;
                }
            }

            DashboardEvent::OnlinePeers(count) => self.view.online_peers = count,

            DashboardEvent::Results {
                session_id,
                results,
            } => {
                if self.view.phase.session_id() == Some(session_id.as_str()) {
                    self.view.error = None;
                    self.view.results = Some(results);
                    self.reconcile_timers();
                }
            }

            DashboardEvent::Logs {
                session_id,
                entries,
            } => {
                if self.view.phase.session_id() == Some(session_id.as_str()) && !entries.is_empty()
                {
                    self.view.logs = entries;
                }
            }

            DashboardEvent::Failed { concern, message } => {
                if concern == Concern::Results && self.view.phase.session_id().is_some() {
                    self.view.error = Some(message);
                }
            }
        }
    }

    /// Starts or stops each concern's task so that exactly the ones whose
    /// condition holds are running.
    fn reconcile_timers(&mut self) {
        let role = self.config.role;
        let intervals = self.config.intervals;
        let phase = &self.view.phase;

        if role == Role::Peer && phase.is_online() {
            let task = polling::uptime(intervals.uptime, self.events_tx.clone());
            self.poller.ensure(Concern::Uptime, task);
        } else {
            self.poller.stop(Concern::Uptime);
            self.view.uptime = Duration::ZERO;
        }

        if role == Role::Trainer && *phase != Phase::LoggedOut {
            let task = polling::online_peers(
                self.backend.clone(),
                intervals.online_peers,
                self.events_tx.clone(),
            );
            self.poller.ensure(Concern::OnlinePeers, task);
        } else {
            self.poller.stop(Concern::OnlinePeers);
        }

        // the results task is only ever started by `monitor`, it keeps
        // itself alive while the session runs
        match phase.session_id().map(str::to_string) {
            Some(session_id) => {
                let finished = self
                    .view
                    .results
                    .as_ref()
                    .is_some_and(|r| !r.status.is_running());

                if finished {
                    self.poller.stop(Concern::Results);
                }

                let task = polling::logs(
                    self.backend.clone(),
                    session_id,
                    intervals.logs,
                    self.events_tx.clone(),
                );
                self.poller.ensure(Concern::Logs, task);
            }
            None => {
                self.poller.stop(Concern::Results);
                self.poller.stop(Concern::Logs);
            }
        }
    }

    /// Turns a backend failure into a dashboard error, logging out if it expired.
    fn fail(&mut self, e: ApiError) -> DashboardError {
        if e.is_session_expired() {
            error!("backend rejected our session");
            self.logout();
            return DashboardError::SessionExpired;
        }

        warn!("backend call failed: {e}");
        self.view.error = Some(e.to_string());
        DashboardError::Api(e)
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), DashboardError> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> DashboardError {
        DashboardError::InvalidTransition {
            action,
            phase: self.view.phase.name(),
        }
    }

    fn expect_trainer(&self, action: &'static str) -> Result<(), DashboardError> {
        match self.config.role {
            Role::Trainer => Ok(()),
            role => Err(DashboardError::Forbidden {
                action,
                role: role.as_str(),
            }),
        }
    }
}
