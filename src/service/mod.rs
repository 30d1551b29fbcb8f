//! Service lifecycle and control surface.
//!
//! All runtime state (directory layout, lifecycle state, the poll-task
//! handle) lives in the [`Service`] value, so independent instances can
//! coexist and a restart rebuilds everything from scratch instead of
//! resuming leftovers.

pub mod config;
pub mod folders;
mod poll;

pub use config::ServiceConfig;
pub use folders::CommsLayout;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::commands::{CommandExecutor, ScriptRunner};
use crate::error::BridgeError;

/// Severity of a log-sink message. Totally ordered: a sink configured at
/// `Info` never sees `Debug` or `Verbose` messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Debug,
    Verbose,
}

/// Callback invoked with every notable service event, after severity
/// filtering. Front-ends hang their log viewers off this.
pub type LogSink = Arc<dyn Fn(&str, Severity) + Send + Sync>;

/// Internal event reporter: fans each message out to `tracing` and, when
/// the severity clears the configured ceiling, to the optional sink.
#[derive(Clone, Default)]
pub(crate) struct ServiceLog {
    sink: Option<LogSink>,
    verbosity: Severity,
}

impl ServiceLog {
    fn new(sink: Option<LogSink>, verbosity: Severity) -> Self {
        Self { sink, verbosity }
    }

    pub(crate) fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    pub(crate) fn debug(&self, message: &str) {
        self.emit(Severity::Debug, message);
    }

    pub(crate) fn verbose(&self, message: &str) {
        self.emit(Severity::Verbose, message);
    }

    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Debug => tracing::debug!("{message}"),
            Severity::Verbose => tracing::trace!("{message}"),
        }
        if let Some(sink) = &self.sink {
            if severity <= self.verbosity {
                sink(message, severity);
            }
        }
    }
}

/// Lifecycle of a service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct PollHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// A file-protocol bridge instance.
///
/// `start` must be called from within a Tokio runtime; the poll loop runs
/// as a spawned task until `stop`.
pub struct Service {
    config: ServiceConfig,
    layout: CommsLayout,
    executor: Arc<CommandExecutor>,
    log: ServiceLog,
    state: Mutex<ServiceState>,
    poll: Mutex<Option<PollHandle>>,
}

impl Service {
    pub fn new(config: ServiceConfig) -> Self {
        let layout = CommsLayout::new(&config.base_path);
        let log = ServiceLog::new(None, config.verbosity);
        Self {
            config,
            layout,
            executor: Arc::new(CommandExecutor::new()),
            log,
            state: Mutex::new(ServiceState::Stopped),
            poll: Mutex::new(None),
        }
    }

    /// Attach a log sink receiving events at or below the configured
    /// verbosity.
    pub fn with_log_sink(mut self, sink: impl Fn(&str, Severity) + Send + Sync + 'static) -> Self {
        self.log.sink = Some(Arc::new(sink));
        self
    }

    /// Substitute the automation capability behind `execute` requests.
    pub fn with_runner(mut self, runner: Box<dyn ScriptRunner>) -> Self {
        self.executor = Arc::new(CommandExecutor::with_runner(runner));
        self
    }

    pub fn layout(&self) -> &CommsLayout {
        &self.layout
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServiceState::Running
    }

    /// Set up the communication folders, advertise liveness, and arm the
    /// poll loop. A folder-setup failure leaves no partial state behind:
    /// the state returns to `Stopped` and no task is spawned. Starting an
    /// already-running instance is a no-op.
    pub fn start(&self) -> Result<(), BridgeError> {
        {
            let mut state = self.state.lock();
            if *state != ServiceState::Stopped {
                self.log.debug("start ignored, service already running");
                return Ok(());
            }
            *state = ServiceState::Starting;
        }

        self.log
            .info(&format!("starting service at {}", self.layout.base.display()));

        if let Err(e) = self.layout.ensure() {
            *self.state.lock() = ServiceState::Stopped;
            self.log
                .info(&format!("failed to set up communication folders: {e}"));
            return Err(e);
        }

        // The discovery file is advisory; a failed write does not keep
        // the protocol itself from working.
        if let Err(e) = self.layout.write_info("running") {
            self.log.info(&format!("failed to write service info file: {e}"));
        }

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(poll::run(
            self.layout.clone(),
            Arc::clone(&self.executor),
            self.log.clone(),
            self.config.poll_interval(),
            rx,
        ));
        *self.poll.lock() = Some(PollHandle { shutdown, task });
        *self.state.lock() = ServiceState::Running;

        self.log.info("service started");
        Ok(())
    }

    /// Cancel the next scheduled tick and wait for the loop to wind down;
    /// a tick already in progress runs to completion. Idempotent.
    pub async fn stop(&self) {
        let handle = {
            let mut state = self.state.lock();
            if *state != ServiceState::Running {
                return;
            }
            *state = ServiceState::Stopping;
            self.poll.lock().take()
        };

        self.log.info("stopping service...");
        if let Some(handle) = handle {
            let _ = handle.shutdown.send(true);
            let _ = handle.task.await;
        }

        if let Err(e) = self.layout.write_info("stopped") {
            self.log.debug(&format!("failed to update service info file: {e}"));
        }

        *self.state.lock() = ServiceState::Stopped;
        self.log.info("service stopped");
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        // Best effort: let a still-armed poll task wind down on its own.
        if let Some(handle) = self.poll.lock().take() {
            let _ = handle.shutdown.send(true);
        }
    }
}
