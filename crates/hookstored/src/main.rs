// # hookstored - hookstore daemon
//
// Thin host process. All polling, transport and fan-out logic lives in
// hookstore-core and hookstore-http; this binary only wires them together:
//
// 1. Read configuration from environment variables
// 2. Initialize logging
// 3. Build the store client, the watch fan-out and the poller
// 4. Start polling and wait for SIGTERM/SIGINT
// 5. Stop the poller
//
// ## Configuration
//
// - `HOOKSTORE_ADDRESS`: base address of the store (required)
// - `HOOKSTORE_BUCKET`: bucket holding the registrations (default: webhooks)
// - `HOOKSTORE_AUTH_TOKEN`: bearer token (optional)
// - `HOOKSTORE_TIMEOUT_SECS`: per-request timeout (default: 30)
// - `HOOKSTORE_PULL_INTERVAL_MS`: poll interval, 0 for default (default: 5000)
// - `HOOKSTORE_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export HOOKSTORE_ADDRESS=https://store.example.com
// export HOOKSTORE_AUTH_TOKEN=your_token
// export HOOKSTORE_PULL_INTERVAL_MS=10000
//
// hookstored
// ```

use anyhow::{Context, Result};
use hookstore_core::{
    AtomicPollMetrics, CounterPollMetrics, Fanout, HookstoreConfig, Item, PollMetrics, Poller,
    PollerConfig, SizeWatch, WatchFn,
};
use hookstore_http::{AuthDecorator, BearerTokenDecorator, StoreClient};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum HookstoredExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<HookstoredExitCode> for ExitCode {
    fn from(code: HookstoredExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    hookstore: HookstoreConfig,
    auth_token: Option<String>,
    log_level: Level,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hookstore", &self.hookstore)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<REDACTED>"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let address = lookup("HOOKSTORE_ADDRESS").context(
            "HOOKSTORE_ADDRESS is required. \
            Set it via: export HOOKSTORE_ADDRESS=https://store.example.com",
        )?;

        let mut hookstore = HookstoreConfig::new(address);
        if let Some(bucket) = lookup("HOOKSTORE_BUCKET") {
            hookstore.store.bucket = bucket;
        }
        if let Some(timeout) = lookup("HOOKSTORE_TIMEOUT_SECS") {
            hookstore.store.timeout_secs = parse_number("HOOKSTORE_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(interval) = lookup("HOOKSTORE_PULL_INTERVAL_MS") {
            hookstore.listener.pull_interval_ms =
                parse_number("HOOKSTORE_PULL_INTERVAL_MS", &interval)?;
        }

        let log_level = match lookup("HOOKSTORE_LOG_LEVEL") {
            Some(level) => parse_log_level(&level)?,
            None => Level::INFO,
        };

        Ok(Self {
            hookstore,
            auth_token: lookup("HOOKSTORE_AUTH_TOKEN").filter(|t| !t.is_empty()),
            log_level,
        })
    }

    fn validate(&self) -> Result<()> {
        self.hookstore
            .validate()
            .context("invalid store configuration")?;
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a non-negative integer. Got: {value}"))
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "HOOKSTORE_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return HookstoredExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return HookstoredExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookstoredExitCode::ConfigError.into();
    }

    info!(?config, "Starting hookstored daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookstoredExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            HookstoredExitCode::RuntimeError
        } else {
            HookstoredExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire client → poller → fan-out and run until a shutdown signal
async fn run_daemon(config: Config) -> Result<()> {
    let auth = config
        .auth_token
        .map(|token| Arc::new(BearerTokenDecorator::new(token)) as Arc<dyn AuthDecorator>);
    let client = StoreClient::new(&config.hookstore.store, auth)
        .context("failed to build store client")?;

    let fanout = Fanout::items()
        .with_watch(Arc::new(SizeWatch))
        .with_watch(Arc::new(WatchFn(|items: &[Item]| {
            info!(count = items.len(), "Registration set refreshed");
        })));

    let totals = Arc::new(AtomicPollMetrics::new());
    let sinks: Vec<Arc<dyn PollMetrics>> = vec![
        Arc::new(CounterPollMetrics::new(
            config.hookstore.listener.poll_counter_name.clone(),
        )),
        totals.clone(),
    ];

    let poller = Poller::new(
        PollerConfig::new()
            .with_fetcher(Arc::new(client))
            .with_listener(Arc::new(fanout))
            .with_pull_interval(config.hookstore.listener.pull_interval())
            .with_metrics(Arc::new(sinks)),
    )
    .context("failed to build poller")?;

    poller.start().context("failed to start poller")?;
    info!(
        bucket = %config.hookstore.store.bucket,
        interval = ?poller.pull_interval(),
        "Polling store"
    );

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    poller.stop().context("failed to stop poller")?;
    info!(
        successes = totals.successes(),
        failures = totals.failures(),
        "Poller stopped"
    );

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("failed to set up SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to set up SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
