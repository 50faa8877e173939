use crate::output::{BusinessRecord, CrawlStatistics, ResultSink, Snapshot, SnapshotReader};
use crate::state::dedup::DedupSet;
use crate::state::termination::{Classification, TerminationPolicy};
use std::fmt;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An external stop was requested
    UserRequested,

    /// Too many consecutive empty rows were produced
    EmptyThreshold { threshold: u32 },

    /// A listing page yielded no candidates or could not be fetched
    DirectoryExhausted,

    /// The caller-imposed page bound was reached
    PageLimit { max_pages: u32 },
}

impl StopReason {
    /// Returns true if the crawl ended on its own rather than by request
    pub fn is_natural_end(&self) -> bool {
        matches!(self, Self::DirectoryExhausted | Self::PageLimit { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRequested => write!(f, "Scraper stopped by user."),
            Self::EmptyThreshold { threshold } => write!(
                f,
                "Scraper stopped after encountering more than {} consecutive empty rows.",
                threshold
            ),
            Self::DirectoryExhausted => write!(f, "No more businesses found. Scraping finished."),
            Self::PageLimit { max_pages } => {
                write!(f, "Reached the page limit of {}. Scraping finished.", max_pages)
            }
        }
    }
}

/// All mutable state of a single crawl run
///
/// A fresh `CrawlState` is created for every crawl and dropped when the run
/// ends. The controller owns it exclusively; everyone else observes results
/// through a [`SnapshotReader`].
#[derive(Debug)]
pub struct CrawlState {
    state_code: String,
    current_page: u32,
    seen: DedupSet,
    termination: TerminationPolicy,
    stop_reason: Option<StopReason>,
    sink: ResultSink,
    stats: CrawlStatistics,
}

impl CrawlState {
    /// Creates the state for a new run starting at page 1
    pub fn new(state_code: &str, empty_row_threshold: u32) -> Self {
        Self {
            state_code: state_code.to_lowercase(),
            current_page: 1,
            seen: DedupSet::new(),
            termination: TerminationPolicy::new(empty_row_threshold),
            stop_reason: None,
            sink: ResultSink::new(),
            stats: CrawlStatistics::default(),
        }
    }

    pub fn state_code(&self) -> &str {
        &self.state_code
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Moves on to the next listing page
    pub fn advance_page(&mut self) {
        self.current_page += 1;
    }

    pub fn seen(&self) -> &DedupSet {
        &self.seen
    }

    /// Admits a business name before its detail page is fetched
    ///
    /// Returns `false` for repeats, which must be skipped without a fetch.
    pub fn admit(&mut self, name: &str) -> bool {
        self.stats.candidates_seen += 1;
        if self.seen.insert(name) {
            true
        } else {
            self.stats.duplicates_skipped += 1;
            false
        }
    }

    /// Classifies a produced record and appends whatever the policy allows
    ///
    /// Once the run is stopped (for any reason) records are discarded and
    /// [`Classification::Halt`] is returned.
    pub fn accept(&mut self, record: BusinessRecord) -> Classification {
        if self.is_stopped() {
            self.stats.discarded_after_stop += 1;
            return Classification::Halt;
        }

        let verdict = self.termination.classify(record);
        match &verdict {
            Classification::Record(record) => {
                self.stats.records += 1;
                if record.has_phone() {
                    self.stats.phones_found += 1;
                }
                self.sink.append(record.clone());
            }
            Classification::Placeholder => {
                self.stats.placeholders += 1;
                self.sink.append(BusinessRecord::empty());
            }
            Classification::Suppressed => {
                self.stats.suppressed += 1;
            }
            Classification::Halt => {
                self.request_stop(StopReason::EmptyThreshold {
                    threshold: self.termination.threshold(),
                });
            }
        }
        verdict
    }

    /// Sets the stop flag
    ///
    /// The first reason wins; later requests are ignored.
    pub fn request_stop(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            tracing::debug!("Stop requested: {:?}", reason);
            self.stop_reason = Some(reason);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_reason.is_some()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn consecutive_empty(&self) -> u32 {
        self.termination.consecutive_empty()
    }

    pub fn reader(&self) -> SnapshotReader {
        self.sink.reader()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sink.snapshot()
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Records that a listing page was requested
    pub fn note_listing_request(&mut self, page: u32) {
        self.stats.last_page_requested = self.stats.last_page_requested.max(page);
    }

    /// Records that a listing page was fetched and parsed
    pub fn note_listing_page(&mut self) {
        self.stats.pages_fetched += 1;
    }

    /// Records that a detail request was issued
    pub fn note_detail_fetch(&mut self) {
        self.stats.detail_fetches += 1;
    }

    /// Records a detail fetch that failed and was skipped
    pub fn note_detail_failure(&mut self) {
        self.stats.detail_failures += 1;
    }

    /// Records a completed fetch whose result arrived after the stop
    pub fn note_discarded(&mut self) {
        self.stats.discarded_after_stop += 1;
    }

    /// Consumes the state, returning the final statistics
    pub fn into_stats(self) -> CrawlStatistics {
        let mut stats = self.stats;
        stats.distinct_names = self.seen.len() as u64;
        stats
    }
}
