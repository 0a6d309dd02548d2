//! Poll outcome metrics
//!
//! - Counters:
//!   - Poll cycles, labeled by `outcome` (`success` or `failure`)
//! - Gauges:
//!   - Size of the latest registration set (see [`crate::watch::SizeWatch`])

use metrics::{Counter, counter, describe_counter, describe_gauge};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) const OUTCOME_LABEL: &str = "outcome";

const POLLS_HELP: &str = "Number of store polls, labeled by outcome";

pub(crate) const LIST_SIZE: &str = "hookstore_webhook_list_size";
const LIST_SIZE_HELP: &str = "Number of registrations in the latest polled set";

static DESCRIBE: LazyLock<()> = LazyLock::new(|| {
    describe_gauge!(LIST_SIZE, LIST_SIZE_HELP);
});

pub(crate) fn describe() {
    LazyLock::force(&DESCRIBE);
}

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollOutcome {
    /// Items were fetched and handed to the listener
    Success,
    /// The fetch failed; the listener was not called
    Failure,
}

impl PollOutcome {
    /// Label value for this outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Sink for poll outcomes
///
/// Called once per poll cycle from the poll loop.
pub trait PollMetrics: Send + Sync {
    /// Record the outcome of one poll cycle
    fn record_poll(&self, outcome: PollOutcome);
}

/// Records poll outcomes as a labeled counter through the `metrics` facade
#[derive(Debug, Clone)]
pub struct CounterPollMetrics {
    success: Counter,
    failure: Counter,
}

impl CounterPollMetrics {
    /// Register the counter under `name`
    pub fn new(name: impl Into<String>) -> Self {
        describe();

        let name = name.into();
        describe_counter!(name.clone(), POLLS_HELP);

        Self {
            success: counter!(name.clone(), OUTCOME_LABEL => PollOutcome::Success.as_str()),
            failure: counter!(name, OUTCOME_LABEL => PollOutcome::Failure.as_str()),
        }
    }
}

impl Default for CounterPollMetrics {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POLL_COUNTER_NAME)
    }
}

impl PollMetrics for CounterPollMetrics {
    fn record_poll(&self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::Success => self.success.increment(1),
            PollOutcome::Failure => self.failure.increment(1),
        }
    }
}

/// Keeps poll outcome totals in memory
///
/// Useful for health reporting in a host process, and for tests.
#[derive(Debug, Default)]
pub struct AtomicPollMetrics {
    success: AtomicU64,
    failure: AtomicU64,
}

impl AtomicPollMetrics {
    /// Create zeroed totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful polls recorded
    pub fn successes(&self) -> u64 {
        self.success.load(Ordering::SeqCst)
    }

    /// Number of failed polls recorded
    pub fn failures(&self) -> u64 {
        self.failure.load(Ordering::SeqCst)
    }
}

impl PollMetrics for AtomicPollMetrics {
    fn record_poll(&self, outcome: PollOutcome) {
        let total = match outcome {
            PollOutcome::Success => &self.success,
            PollOutcome::Failure => &self.failure,
        };
        total.fetch_add(1, Ordering::SeqCst);
    }
}

/// Forwards every outcome to each inner sink
impl PollMetrics for Vec<std::sync::Arc<dyn PollMetrics>> {
    fn record_poll(&self, outcome: PollOutcome) {
        for sink in self {
            sink.record_poll(outcome);
        }
    }
}
