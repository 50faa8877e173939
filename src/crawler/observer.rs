//! Progress callbacks for a running crawl

use crate::output::BusinessRecord;
use crate::state::StopReason;
use tokio_util::sync::CancellationToken;

/// Summary of one fully processed listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReport {
    /// Listing page number
    pub page: u32,

    /// Candidates the listing parser produced for this page
    pub candidates: usize,

    /// Rows in the result list once the page was settled
    pub total_rows: usize,
}

/// Cloneable handle that asks a running crawl to stop
///
/// Stopping only prevents new fetches; requests already on the wire finish
/// and their results are discarded.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Requests the crawl to stop; calling it again has no effect
    pub fn request_stop(&self) {
        self.token.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Receives crawl progress
///
/// Callbacks run synchronously on the controller, so they must be quick.
/// Every method has a no-op default.
pub trait CrawlObserver: Send + Sync {
    /// Called after every candidate on `report.page` has been settled
    fn on_page_complete(&self, _report: &PageReport, _stop: &StopHandle) {}

    /// Called for every row appended to the result list, placeholders included
    fn on_record(&self, _record: &BusinessRecord) {}

    /// Called once when the crawl ends
    fn on_stop(&self, _reason: StopReason) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {}

/// Observer that reports progress through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl CrawlObserver for LoggingObserver {
    fn on_page_complete(&self, report: &PageReport, _stop: &StopHandle) {
        tracing::info!(
            "Page {} done: {} candidates, {} rows so far",
            report.page,
            report.candidates,
            report.total_rows
        );
    }

    fn on_stop(&self, reason: StopReason) {
        tracing::info!("{}", reason);
    }
}
