//! Periodic monitoring of one server.
//!
//! A session runs a control loop on its own task. Every tick launches a
//! probe on a worker task unless one is still outstanding, in which case
//! the tick is dropped. Completed results are folded into the session's
//! [`MonitorState`] and forwarded to the [`StatusSink`]; reachability
//! flips additionally go to the [`Notifier`].
//!
//! Stopping cancels the ticker immediately. A probe already in flight is
//! left to finish on its own, and its result is thrown away.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, NotifyError, ProbeError};
use crate::probe::Probe;
use crate::state::{MonitorState, Observation};
use crate::status::{Address, ProbeResult, Reachability};

/// Polling period used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(120);

// ── Collaborators ────────────────────────────────────────────────

/// Receives every applied probe result, e.g. to redraw a status view.
pub trait StatusSink: Send + Sync + 'static {
    fn on_status(&self, result: &ProbeResult);
}

impl<F> StatusSink for F
where
    F: Fn(&ProbeResult) + Send + Sync + 'static,
{
    fn on_status(&self, result: &ProbeResult) {
        self(result)
    }
}

/// Delivers a reachability-change notification to the user.
///
/// Errors are logged by the monitor and otherwise ignored.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Title and body for a reachability change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn for_result(address: &Address, result: &ProbeResult) -> Self {
        let message = match result {
            ProbeResult::Status(status) => format!(
                "{address}\nPlayers {}/{}",
                status.players_online, status.players_max
            ),
            ProbeResult::Failure(_) => format!("{address}\nServer not reachable"),
        };
        Self {
            title: format!("MC Server {}", result.reachability()),
            message,
        }
    }
}

// ── MonitorConfig ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between probe ticks.
    pub interval: Duration,
    /// Notify on the very first result of a session too.
    pub notify_on_first: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            notify_on_first: false,
        }
    }
}

// ── MonitorHandle ────────────────────────────────────────────────

/// A running monitoring session.
///
/// Dropping the handle stops the session the same way
/// [`stop`](Self::stop) does.
#[derive(Debug)]
pub struct MonitorHandle {
    state: Arc<Mutex<MonitorState>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Start monitoring `address`. The first probe fires immediately.
    pub fn spawn(
        address: Address,
        config: MonitorConfig,
        probe: Arc<dyn Probe>,
        sink: Arc<dyn StatusSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MonitorError> {
        if config.interval.is_zero() {
            return Err(MonitorError::ZeroInterval);
        }

        let state = Arc::new(Mutex::new(MonitorState::new(address.clone(), config.interval)));
        let cancel = CancellationToken::new();
        let session = Session {
            address,
            config,
            state: Arc::clone(&state),
            cancel: cancel.clone(),
            probe,
            sink,
            notifier,
        };
        let task = tokio::spawn(session.run());

        Ok(Self {
            state,
            cancel,
            task: Some(task),
        })
    }

    /// Stop ticking. Any probe in flight finishes but is not applied.
    pub fn stop(&self) {
        lock(&self.state).stop();
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).is_running()
    }

    pub fn address(&self) -> Address {
        lock(&self.state).address().clone()
    }

    pub fn last_reachability(&self) -> Reachability {
        lock(&self.state).last_reachability()
    }

    /// Wait for the control loop to exit after [`stop`](Self::stop).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("monitor task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Session ──────────────────────────────────────────────────────

struct Session {
    address: Address,
    config: MonitorConfig,
    state: Arc<Mutex<MonitorState>>,
    cancel: CancellationToken,
    probe: Arc<dyn Probe>,
    sink: Arc<dyn StatusSink>,
    notifier: Arc<dyn Notifier>,
}

impl Session {
    async fn run(self) {
        info!(address = %self.address, interval = ?self.config.interval, "monitoring started");

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Holds at most one probe.
        let mut in_flight: JoinSet<ProbeResult> = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let result = joined.unwrap_or_else(|e| {
                        ProbeResult::Failure(ProbeError::Other(format!("probe task failed: {e}")))
                    });
                    self.apply(result).await;
                }

                _ = ticker.tick() => {
                    if !in_flight.is_empty() {
                        debug!(address = %self.address, "probe still in flight; tick skipped");
                        continue;
                    }
                    let probe = Arc::clone(&self.probe);
                    let address = self.address.clone();
                    in_flight.spawn(async move { probe.probe(&address).await });
                }
            }
        }

        // Let an outstanding probe finish; its result goes nowhere.
        if !in_flight.is_empty() {
            debug!(address = %self.address, "discarding in-flight probe");
        }
        in_flight.detach_all();
        info!(address = %self.address, "monitoring stopped");
    }

    async fn apply(&self, result: ProbeResult) {
        let observation = lock(&self.state).observe(result.reachability());
        if !observation.is_applied() {
            debug!(address = %self.address, "session stopped; probe result discarded");
            return;
        }

        self.sink.on_status(&result);

        if let Observation::Changed { from, to } = observation {
            match to {
                Reachability::Offline => warn!(address = %self.address, "{from} -> {to}"),
                _ => info!(address = %self.address, "{from} -> {to}"),
            }
        }
        if observation.notifies(self.config.notify_on_first) {
            let note = Notification::for_result(&self.address, &result);
            if let Err(e) = self.notifier.notify(&note.title, &note.message).await {
                warn!(address = %self.address, "notification failed: {e}");
            }
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────

/// Owns the collaborators and at most one active session.
///
/// Starting again with a new address replaces the previous session and
/// its state.
pub struct Monitor {
    config: MonitorConfig,
    probe: Arc<dyn Probe>,
    sink: Arc<dyn StatusSink>,
    notifier: Arc<dyn Notifier>,
    session: Option<MonitorHandle>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        probe: impl Probe,
        sink: impl StatusSink,
        notifier: impl Notifier,
    ) -> Self {
        Self {
            config,
            probe: Arc::new(probe),
            sink: Arc::new(sink),
            notifier: Arc::new(notifier),
            session: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Parse `input` and start monitoring it.
    pub fn start(&mut self, input: &str) -> Result<(), MonitorError> {
        let address = Address::parse(input)?;
        self.start_address(address)
    }

    /// Start monitoring `address`, replacing any current session.
    pub fn start_address(&mut self, address: Address) -> Result<(), MonitorError> {
        self.stop();
        let handle = MonitorHandle::spawn(
            address,
            self.config.clone(),
            Arc::clone(&self.probe),
            Arc::clone(&self.sink),
            Arc::clone(&self.notifier),
        )?;
        self.session = Some(handle);
        Ok(())
    }

    /// Stop the current session, if any.
    pub fn stop(&mut self) {
        if let Some(handle) = self.session.take() {
            handle.stop();
        }
    }

    /// Stop the current session and wait for its control loop to exit.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.session.take() {
            handle.stop();
            handle.join().await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(MonitorHandle::is_running)
    }

    pub fn session(&self) -> Option<&MonitorHandle> {
        self.session.as_ref()
    }
}

// ── Tests ────────────────────────────────────────────────────────
