//! Background poller
//!
//! The [`Poller`] fetches the item set on a fixed interval and hands it to a
//! [`Listener`]. It is controlled through [`Poller::start`] and
//! [`Poller::stop`], which may be called concurrently from any number of
//! callers.
//!
//! ## State Machine
//!
//! ```text
//!            start()                      stop()
//! ┌─────────┐ CAS  ┌───────────────┐ ┌─────────┐ CAS  ┌───────────────┐
//! │ Stopped │─────▶│ Transitioning │▶│ Running │─────▶│ Transitioning │─▶ Stopped
//! └─────────┘      └───────────────┘ └─────────┘      └───────────────┘
//! ```
//!
//! Each call gets an immediate answer: a `start` that does not win the
//! `Stopped → Transitioning` exchange fails with
//! [`Error::ListenerNotStopped`], a `stop` that does not win
//! `Running → Transitioning` fails with [`Error::ListenerNotRunning`].
//! Neither call ever waits on the other.
//!
//! ## Poll Loop
//!
//! 1. Wait for the next tick (first tick one interval after `start`)
//! 2. Fetch the unscoped item set
//! 3. On success, call the listener and record `success`
//! 4. On failure, log, skip the listener and record `failure`
//!
//! Fetch errors never end the loop. Only the shutdown signal sent by `stop`
//! (or dropping the poller) does.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{ListenerConfig, effective_interval};
use crate::error::{ConfigViolation, Error, Result};
use crate::metrics::{CounterPollMetrics, PollMetrics, PollOutcome};
use crate::traits::{ItemFetcher, Listener};

/// Lifecycle state of a [`Poller`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PollerState {
    /// Not polling; `start` is allowed
    Stopped = 0,
    /// Polling; `stop` is allowed
    Running = 1,
    /// A `start` or `stop` is in its critical section
    Transitioning = 2,
}

impl PollerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Stopped,
            1 => Self::Running,
            _ => Self::Transitioning,
        }
    }
}

/// Construction parameters for a [`Poller`]
///
/// `fetcher` and `listener` are required; [`Poller::new`] reports every
/// missing piece in one [`Error::InvalidConfig`].
#[derive(Clone)]
pub struct PollerConfig {
    /// Where items are fetched from
    pub fetcher: Option<Arc<dyn ItemFetcher>>,

    /// Who is told about each fetched set
    pub listener: Option<Arc<dyn Listener>>,

    /// Interval between polls; zero means the default
    pub pull_interval: Duration,

    /// Outcome sink; defaults to [`CounterPollMetrics`]
    pub metrics: Option<Arc<dyn PollMetrics>>,
}

impl PollerConfig {
    /// Create an empty configuration with the default interval
    pub fn new() -> Self {
        Self {
            fetcher: None,
            listener: None,
            pull_interval: crate::config::DEFAULT_PULL_INTERVAL,
            metrics: None,
        }
    }

    /// Create a configuration from serialized listener settings
    ///
    /// The outcome counter is registered under the configured name.
    pub fn from_listener_config(config: &ListenerConfig) -> Self {
        Self::new()
            .with_pull_interval(config.pull_interval())
            .with_metrics(Arc::new(CounterPollMetrics::new(
                config.poll_counter_name.clone(),
            )))
    }

    /// Set the item source
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ItemFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the listener
    pub fn with_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set the pull interval
    pub fn with_pull_interval(mut self, pull_interval: Duration) -> Self {
        self.pull_interval = pull_interval;
        self
    }

    /// Set the outcome sink
    pub fn with_metrics(mut self, metrics: Arc<dyn PollMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PollerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerConfig")
            .field("fetcher", &self.fetcher.is_some())
            .field("listener", &self.listener.is_some())
            .field("pull_interval", &self.pull_interval)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Everything the poll loop task needs, shared with the [`Poller`]
struct PollCycle {
    fetcher: Arc<dyn ItemFetcher>,
    listener: Arc<dyn Listener>,
    metrics: Arc<dyn PollMetrics>,
    pull_interval: Duration,

    /// Held for the duration of each fetch-notify cycle.
    ///
    /// A loop told to stop may still be inside its listener call when the
    /// next `start` spawns a new loop; this keeps their cycles apart.
    in_cycle: tokio::sync::Mutex<()>,
}

impl PollCycle {
    async fn run_once(&self) -> PollOutcome {
        let _cycle = self.in_cycle.lock().await;

        let outcome = match self.fetcher.get_items("").await {
            Ok(items) => {
                debug!(count = items.len(), "Fetched item set");
                self.listener.update(&items);
                PollOutcome::Success
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch items");
                PollOutcome::Failure
            }
        };

        self.metrics.record_poll(outcome);
        outcome
    }

    async fn run(self: Arc<Self>, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.pull_interval, self.pull_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.run_once() => {}
            }
        }

        debug!("Poll loop exited");
    }
}

/// Recurring fetch-and-notify loop with a start/stop state machine
///
/// Dropping a running poller ends its loop.
pub struct Poller {
    cycle: Arc<PollCycle>,
    state: AtomicU8,

    /// Sender half of the running loop's shutdown signal.
    ///
    /// Only touched while the state is `Transitioning`, so the lock is never
    /// contended.
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl Poller {
    /// Create a stopped poller
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] listing every missing collaborator.
    pub fn new(config: PollerConfig) -> Result<Self> {
        let mut violations = Vec::new();
        if config.listener.is_none() {
            violations.push(ConfigViolation::MissingListener);
        }
        if config.fetcher.is_none() {
            violations.push(ConfigViolation::MissingFetcher);
        }

        let (Some(fetcher), Some(listener)) = (config.fetcher, config.listener) else {
            return Err(Error::InvalidConfig(violations));
        };

        let metrics = config
            .metrics
            .unwrap_or_else(|| Arc::new(CounterPollMetrics::default()));

        Ok(Self {
            cycle: Arc::new(PollCycle {
                fetcher,
                listener,
                metrics,
                pull_interval: effective_interval(config.pull_interval),
                in_cycle: tokio::sync::Mutex::new(()),
            }),
            state: AtomicU8::new(PollerState::Stopped as u8),
            shutdown: Mutex::new(None),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> PollerState {
        PollerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Interval between polls
    pub fn pull_interval(&self) -> Duration {
        self.cycle.pull_interval
    }

    /// Start the poll loop
    ///
    /// Must be called from within a tokio runtime; the loop is spawned on the
    /// current runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::ListenerNotStopped`] if the poller is running or another
    ///   `start`/`stop` is in progress
    /// - [`Error::RuntimeUnavailable`] if there is no current runtime; the
    ///   poller stays stopped
    pub fn start(&self) -> Result<()> {
        self.begin_transition(PollerState::Stopped)
            .map_err(|_| Error::ListenerNotStopped)?;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Cannot start poller outside a tokio runtime");
                self.finish_transition(PollerState::Stopped);
                return Err(Error::RuntimeUnavailable);
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        runtime.spawn(Arc::clone(&self.cycle).run(shutdown_rx));
        *self.shutdown_slot() = Some(shutdown_tx);

        self.finish_transition(PollerState::Running);
        info!(interval = ?self.cycle.pull_interval, "Poller started");
        Ok(())
    }

    /// Stop the poll loop
    ///
    /// Sends the shutdown signal and returns without waiting for the loop
    /// task to exit.
    ///
    /// # Errors
    ///
    /// [`Error::ListenerNotRunning`] if the poller is stopped or another
    /// `start`/`stop` is in progress.
    pub fn stop(&self) -> Result<()> {
        self.begin_transition(PollerState::Running)
            .map_err(|_| Error::ListenerNotRunning)?;

        if let Some(shutdown_tx) = self.shutdown_slot().take() {
            // The loop only goes away on this signal or on drop, so a closed
            // receiver here means the task already ended.
            let _ = shutdown_tx.send(());
        }

        self.finish_transition(PollerState::Stopped);
        info!("Poller stopped");
        Ok(())
    }

    fn begin_transition(&self, from: PollerState) -> std::result::Result<(), PollerState> {
        self.state
            .compare_exchange(
                from as u8,
                PollerState::Transitioning as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
            .map_err(PollerState::from_u8)
    }

    fn finish_transition(&self, to: PollerState) {
        self.state.swap(to as u8, Ordering::SeqCst);
    }

    fn shutdown_slot(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.shutdown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("state", &self.state())
            .field("pull_interval", &self.cycle.pull_interval)
            .finish()
    }
}
