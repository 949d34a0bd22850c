//! Lifecycle of the three periodic tasks.
//!
//! `Starting -> Running -> ShuttingDown -> Stopped`. The tasks are started
//! together, run until the cancellation signal is set, and are all joined
//! before [`run`] returns.

use std::{fmt, time::Duration};

use anyhow::Context;
use backon::ConstantBuilder;
use tokio::task::JoinHandle;

use crate::{
    acquisition::Acquisition,
    cancel::CancellationSignal,
    capability::{CharacterDisplay, Sensor, TelemetrySink},
    config::Config,
    error::Fault,
    presentation::Presentation,
    publication::Publication,
    store::SharedReadingStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Starting => "starting",
            State::Running => "running",
            State::ShuttingDown => "shutting down",
            State::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Cadence and setup policy of the tasks.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub acquisition_period: Duration,
    pub presentation_period: Duration,
    pub publication_period: Duration,
    pub series: String,
    pub setup_retry: ConstantBuilder,
}

impl From<&Config> for Schedule {
    fn from(config: &Config) -> Self {
        Self {
            acquisition_period: config.acquisition.period(),
            presentation_period: config.presentation.period(),
            publication_period: config.publication.period(),
            series: config.publication.series.clone(),
            setup_retry: config.setup_retry.builder(),
        }
    }
}

pub struct AppContext {
    pub store: SharedReadingStore,
    pub cancel: CancellationSignal,
    pub sensor: Box<dyn Sensor>,
    pub display: Box<dyn CharacterDisplay>,
    pub sink: Box<dyn TelemetrySink>,
    pub schedule: Schedule,
}

impl AppContext {
    pub fn new(
        schedule: Schedule,
        sensor: Box<dyn Sensor>,
        display: Box<dyn CharacterDisplay>,
        sink: Box<dyn TelemetrySink>,
    ) -> Self {
        Self {
            store: SharedReadingStore::new(),
            cancel: CancellationSignal::new(),
            sensor,
            display,
            sink,
            schedule,
        }
    }
}

/// Runs the tasks until `shutdown` resolves or the context's cancellation
/// signal is set by other means, then waits for all of them to finish.
///
/// A task that ended with a [`Fault`] does not fail the shutdown; a task
/// that panicked does.
pub async fn run<F>(ctx: AppContext, shutdown: F) -> Result<(), anyhow::Error>
where
    F: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
{
    let mut state = State::Starting;
    log::info!("Orchestrator {state}");

    let AppContext {
        store,
        cancel,
        sensor,
        display,
        sink,
        schedule,
    } = ctx;

    let tasks: [(&str, JoinHandle<Result<(), Fault>>); 3] = [
        (
            "acquisition",
            tokio::spawn(Acquisition::new(sensor, store.clone()).run(
                schedule.acquisition_period,
                cancel.clone(),
                schedule.setup_retry,
            )),
        ),
        (
            "presentation",
            tokio::spawn(Presentation::new(display, store.clone()).run(
                schedule.presentation_period,
                cancel.clone(),
                schedule.setup_retry,
            )),
        ),
        (
            "publication",
            tokio::spawn(Publication::new(sink, store, schedule.series).run(
                schedule.publication_period,
                cancel.clone(),
                schedule.setup_retry,
            )),
        ),
    ];

    // The handler only sets the flag; everything else happens here.
    let handler = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = shutdown.await;
            cancel.cancel();
            result
        })
    };

    state = State::Running;
    log::info!("Orchestrator {state}");

    cancel.cancelled().await;

    state = State::ShuttingDown;
    log::info!("Orchestrator {state}");

    // No-op if the handler is what cancelled us; its result is kept.
    handler.abort();
    let signal_result = match handler.await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(e).context("Shutdown handler panicked"),
    };

    let mut panicked = Vec::new();
    for (name, task) in tasks {
        match task.await {
            Ok(Ok(())) => log::debug!("{name} task joined"),
            Ok(Err(e)) => log::warn!("{name} task had terminated early: {e}"),
            Err(e) => {
                log::error!("{name} task panicked: {e}");
                panicked.push(name);
            }
        }
    }

    state = State::Stopped;
    log::info!("Orchestrator {state}");

    if !panicked.is_empty() {
        anyhow::bail!("Tasks panicked: {}", panicked.join(", "));
    }
    signal_result.context("Failed to wait for shutdown signal")
}

/// Resolves on SIGINT, or SIGTERM on unix.
///
/// Later signals are absorbed once the handlers are registered, so repeated
/// interrupts cannot disturb a shutdown in progress.
pub async fn interrupted() -> Result<(), anyhow::Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to wait for Ctrl+C signal")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl+C signal")?;

    Ok(())
}
