use std::{collections::BTreeMap, future::Future, ops::ControlFlow, sync::Arc, time::Duration};

use api::{ApiError, Backend};
use log::{debug, error, warn};
use tokio::{
    runtime::Handle,
    sync::mpsc::Sender,
    task::JoinHandle,
    time::{self, Instant, Interval, MissedTickBehavior},
};

use crate::DashboardEvent;

/// A background refresh owned by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Concern {
    Uptime,
    OnlinePeers,
    Results,
    Logs,
}

/// Keeps at most one running task per [`Concern`].
///
/// Stopping aborts the task right away, dropping the poller stops everything.
pub(crate) struct Poller {
    runtime: Handle,
    tasks: BTreeMap<Concern, JoinHandle<()>>,
}

impl Poller {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: BTreeMap::new(),
        }
    }

    pub fn is_active(&self, concern: Concern) -> bool {
        self.tasks
            .get(&concern)
            .is_some_and(|task| !task.is_finished())
    }

    /// Returns the concerns whose task is still running.
    pub fn active(&self) -> Vec<Concern> {
        self.tasks
            .iter()
            .filter(|(_, task)| !task.is_finished())
            .map(|(concern, _)| *concern)
            .collect()
    }

    /// Spawns `task` unless a live one already serves `concern`.
    pub fn ensure<F>(&mut self, concern: Concern, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.is_active(concern) {
            self.restart(concern, task);
        }
    }

    /// Replaces whatever task serves `concern` with `task`.
    pub fn restart<F>(&mut self, concern: Concern, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.stop(concern);
        debug!("starting {concern:?} timer");
        self.tasks.insert(concern, self.runtime.spawn(task));
    }

    pub fn stop(&mut self, concern: Concern) {
        if let Some(task) = self.tasks.remove(&concern) {
            if !task.is_finished() {
                debug!("stopping {concern:?} timer");
            }
            task.abort();
        }
    }

    pub fn stop_all(&mut self) {
        for (_, task) in std::mem::take(&mut self.tasks) {
            task.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Builds a ticker firing after `first` and then every `period`.
///
/// Late ticks are skipped rather than bunched up, a slow request never
/// causes a burst of follow-up requests.
fn ticker(first: Duration, period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Forwards a failed poll to the dashboard.
///
/// # Returns
/// `Break` if the task must end, either because the session expired or
/// because nobody listens anymore.
async fn report(
    tx: &Sender<DashboardEvent>,
    concern: Concern,
    err: ApiError,
) -> ControlFlow<()> {
    if err.is_session_expired() {
        error!("{concern:?} poll: session expired");
        let _ = tx.send(DashboardEvent::Expired).await;
        return ControlFlow::Break(());
    }

    warn!("{concern:?} poll failed: {err}");
    let event = DashboardEvent::Failed {
        concern,
        message: err.to_string(),
    };

    match tx.send(event).await {
        Ok(()) => ControlFlow::Continue(()),
        Err(_) => ControlFlow::Break(()),
    }
}

pub(crate) async fn uptime(period: Duration, tx: Sender<DashboardEvent>) {
    let mut ticker = ticker(period, period);
    loop {
        ticker.tick().await;
        if tx.send(DashboardEvent::UptimeTick).await.is_err() {
            break;
        }
    }
}

pub(crate) async fn online_peers<B: Backend>(
    backend: Arc<B>,
    period: Duration,
    tx: Sender<DashboardEvent>,
) {
    let mut ticker = ticker(Duration::ZERO, period);
    loop {
        ticker.tick().await;
        debug!("polling online peers");

        let flow = match backend.online_peers().await {
            Ok(count) => match tx.send(DashboardEvent::OnlinePeers(count)).await {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(()),
            },
            Err(e) => report(&tx, Concern::OnlinePeers, e).await,
        };

        if flow.is_break() {
            break;
        }
    }
}

/// Fetches a session's results once after `first`, then every `period` for
/// as long as the last snapshot says the session is running.
///
/// A failure before any running snapshot ends the task, later failures keep
/// the last known status and the polling with it.
pub(crate) async fn results<B: Backend>(
    backend: Arc<B>,
    session_id: String,
    first: Duration,
    period: Duration,
    tx: Sender<DashboardEvent>,
) {
    let mut ticker = ticker(first, period);
    let mut running = false;
    loop {
        ticker.tick().await;
        debug!("polling results of session {session_id}");

        let flow = match backend.fetch_full_results(&session_id).await {
            Ok(results) => {
                running = results.status.is_running();
                let event = DashboardEvent::Results {
                    session_id: session_id.clone(),
                    results,
                };

                match tx.send(event).await {
                    Ok(()) if running => ControlFlow::Continue(()),
                    _ => ControlFlow::Break(()),
                }
            }
            Err(e) => match report(&tx, Concern::Results, e).await {
                ControlFlow::Continue(()) if running => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            },
        };

        if flow.is_break() {
            break;
        }
    }
}

pub(crate) async fn logs<B: Backend>(
    backend: Arc<B>,
    session_id: String,
    period: Duration,
    tx: Sender<DashboardEvent>,
) {
    let mut ticker = ticker(Duration::ZERO, period);
    loop {
        ticker.tick().await;
        debug!("polling logs of session {session_id}");

        let flow = match backend.fetch_logs(&session_id).await {
            Ok(entries) => {
                let event = DashboardEvent::Logs {
                    session_id: session_id.clone(),
                    entries,
                };

                match tx.send(event).await {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            }
            Err(e) => report(&tx, Concern::Logs, e).await,
        };

        if flow.is_break() {
            break;
        }
    }
}
