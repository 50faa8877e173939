//! Start/stop/snapshot control surface
//!
//! A [`Harvester`] runs at most one crawl at a time on the tokio runtime.
//! Callers start it with a state code, poll [`Harvester::snapshot`] while it
//! runs, and either wait for it to end or ask it to stop.

use crate::config::Config;
use crate::crawler::coordinator::{Coordinator, CrawlOutcome};
use crate::crawler::observer::{CrawlObserver, LoggingObserver, StopHandle};
use crate::output::{Snapshot, SnapshotReader};
use crate::state::CrawlState;
use crate::url::normalize_state_code;
use crate::{Result, TradelineError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct RunningCrawl {
    state_code: String,
    stop: StopHandle,
    task: JoinHandle<Result<CrawlOutcome>>,
}

/// Owns the crawl task and exposes the control operations
pub struct Harvester {
    config: Arc<Config>,
    observer: Arc<dyn CrawlObserver>,
    current: Option<RunningCrawl>,
    reader: Option<SnapshotReader>,
}

impl Harvester {
    /// Creates a harvester that logs progress through `tracing`
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            observer: Arc::new(LoggingObserver),
            current: None,
            reader: None,
        }
    }

    /// Replaces the progress observer used by subsequent crawls
    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a crawl of one state's listings
    ///
    /// Each call begins from page 1 with empty results; the previous run's
    /// state is dropped. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`TradelineError::AlreadyRunning`] if a crawl is still in progress,
    /// or an error for an invalid state code or unusable configuration.
    pub fn start(&mut self, state_code: &str) -> Result<()> {
        if self.is_running() {
            return Err(TradelineError::AlreadyRunning);
        }

        let state_code = normalize_state_code(state_code)?;
        let cancel = CancellationToken::new();
        let coordinator = Coordinator::new(&self.config, cancel.clone(), Arc::clone(&self.observer))?;
        let state = CrawlState::new(&state_code, self.config.crawler.empty_row_threshold);

        self.reader = Some(state.reader());
        self.current = Some(RunningCrawl {
            state_code,
            stop: StopHandle::new(cancel),
            task: tokio::spawn(coordinator.run(state)),
        });

        Ok(())
    }

    /// Asks the running crawl to stop; a no-op when nothing is running
    pub fn request_stop(&self) {
        if let Some(run) = &self.current {
            tracing::info!("Stop requested for '{}'", run.state_code);
            run.stop.request_stop();
        }
    }

    /// Handle for stopping the current crawl from elsewhere
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.current.as_ref().map(|run| run.stop.clone())
    }

    /// Point-in-time copy of the rows produced so far
    ///
    /// Never blocks the crawl. After a crawl ends this keeps returning its
    /// final rows until the next [`start`](Self::start).
    pub fn snapshot(&self) -> Snapshot {
        self.reader
            .as_ref()
            .map(SnapshotReader::snapshot)
            .unwrap_or_default()
    }

    /// Returns true while a crawl task is running
    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|run| !run.task.is_finished())
    }

    /// Waits for the current crawl to end and returns its outcome
    pub async fn wait(&mut self) -> Result<CrawlOutcome> {
        let run = self.current.take().ok_or(TradelineError::NotStarted)?;
        run.task.await?
    }
}
