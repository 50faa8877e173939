//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator walks the directory one listing page at a time:
//!
//! 1. Stop if a stop was requested (externally or by the termination policy)
//! 2. Fetch listing page N; a failed fetch or an empty page ends the crawl
//! 3. Admit each new candidate and hand it to the [`DetailScheduler`]
//! 4. Settle finished fetches in candidate order: extract, classify, append
//! 5. Move on to page N + 1
//!
//! The coordinator is the only code that mutates [`CrawlState`]. Detail tasks
//! return extracted fields; classification happens here, one result at a time.

use crate::config::{Config, ListingMode};
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::listing::{CandidateBusiness, ListingParser};
use crate::crawler::observer::{CrawlObserver, LoggingObserver, PageReport, StopHandle};
use crate::crawler::scheduler::{DetailOutcome, DetailScheduler, ScheduledFetch};
use crate::extract::{assemble_record, listing_only_record, DetailExtractor};
use crate::output::{BusinessRecord, CrawlStatistics, Snapshot};
use crate::state::{Classification, CrawlState, StopReason};
use crate::url::{listing_url, normalize_state_code};
use crate::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How a crawl ended and what it produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub reason: StopReason,
    pub stats: CrawlStatistics,

    /// Final result list
    pub records: Snapshot,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlOutcome {
    /// Wall-clock duration of the crawl
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// A candidate waiting to be turned into a row
enum Pending {
    /// No detail link; the row is built from the listing alone
    ListingOnly(CandidateBusiness),

    /// Detail fetch in flight
    Detail(ScheduledFetch),
}

/// Main crawler coordinator structure
pub struct Coordinator {
    base_url: Url,
    client: Client,
    parser: ListingParser,
    scheduler: DetailScheduler,
    mode: ListingMode,
    max_pages: Option<u32>,
    cancel: CancellationToken,
    observer: Arc<dyn CrawlObserver>,
}

impl Coordinator {
    /// Creates a coordinator for one crawl
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl configuration (assumed validated)
    /// * `cancel` - Cancelling this token requests a user stop
    /// * `observer` - Receives progress callbacks
    pub fn new(
        config: &Config,
        cancel: CancellationToken,
        observer: Arc<dyn CrawlObserver>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.directory.base_url)?;
        let client = build_http_client(&config.headers, &config.crawler)?;
        let mode = config.directory.mode;

        let scheduler = DetailScheduler::new(
            client.clone(),
            DetailExtractor::new(mode),
            config.crawler.concurrency as usize,
            Duration::from_millis(config.crawler.download_delay_ms),
            cancel.child_token(),
        );

        Ok(Self {
            base_url,
            client,
            parser: ListingParser::from_config(&config.directory),
            scheduler,
            mode,
            max_pages: config.crawler.max_pages,
            cancel,
            observer,
        })
    }

    /// Handle that requests a stop of this crawl
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.cancel.clone())
    }

    /// Runs the crawl to completion
    ///
    /// Only configuration-level problems (an unbuildable listing URL, a
    /// panicked detail task) surface as errors. Fetch failures and extraction
    /// misses are absorbed and the crawl carries on or ends normally.
    pub async fn run(self, mut state: CrawlState) -> Result<CrawlOutcome> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of '{}' ({} mode)",
            state.state_code(),
            self.mode
        );

        loop {
            self.observe_cancel(&mut state);
            if state.is_stopped() {
                break;
            }

            let page = state.current_page();
            if let Some(max_pages) = self.max_pages {
                if page > max_pages {
                    state.request_stop(StopReason::PageLimit { max_pages });
                    break;
                }
            }

            let url = listing_url(&self.base_url, state.state_code(), page)?;
            state.note_listing_request(page);
            tracing::debug!("Fetching listing page {}: {}", page, url);

            let html = match fetch_page(&self.client, &url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::info!("Listing page {} unavailable, ending crawl: {}", page, e);
                    state.request_stop(StopReason::DirectoryExhausted);
                    break;
                }
            };

            let candidates = self.parser.parse(&html, &url);
            state.note_listing_page();

            if candidates.is_empty() {
                tracing::info!("Listing page {} has no businesses", page);
                state.request_stop(StopReason::DirectoryExhausted);
                break;
            }

            let count = candidates.len();
            tracing::debug!("Listing page {} yielded {} candidates", page, count);

            self.process_page(candidates, &mut state).await?;
            if state.is_stopped() {
                break;
            }

            let report = PageReport {
                page,
                candidates: count,
                total_rows: state.snapshot().len(),
            };
            self.observer.on_page_complete(&report, &self.stop_handle());
            state.advance_page();
        }

        // Loop only exits with a reason set
        let reason = state
            .stop_reason()
            .unwrap_or(StopReason::DirectoryExhausted);
        self.scheduler.close();
        self.observer.on_stop(reason);

        let records = state.snapshot();
        let stats = state.into_stats();
        let finished_at = Utc::now();

        tracing::info!(
            "Crawl finished: {} ({} rows, {} pages in {}s)",
            reason,
            records.len(),
            stats.pages_fetched,
            (finished_at - started_at).num_seconds()
        );

        Ok(CrawlOutcome {
            reason,
            stats,
            records,
            started_at,
            finished_at,
        })
    }

    /// Dispatches and settles every candidate of one listing page
    async fn process_page(
        &self,
        candidates: Vec<CandidateBusiness>,
        state: &mut CrawlState,
    ) -> Result<()> {
        let mut pending: VecDeque<Pending> = VecDeque::new();

        for candidate in candidates {
            self.observe_cancel(state);
            if state.is_stopped() {
                break;
            }

            if !state.admit(&candidate.name) {
                tracing::trace!("Skipping duplicate {}", candidate.name);
                continue;
            }

            let Some(url) = candidate.detail_url.clone() else {
                pending.push_back(Pending::ListingOnly(candidate));
                continue;
            };

            // Free a slot by settling the oldest fetch, keeping rows in order
            let permit = loop {
                if let Some(permit) = self.scheduler.try_acquire() {
                    break Some(permit);
                }
                match pending.pop_front() {
                    Some(item) => self.settle(item, state).await?,
                    None => break self.scheduler.acquire().await,
                }
            };

            self.observe_cancel(state);
            if state.is_stopped() {
                break;
            }

            match permit {
                Some(permit) => {
                    pending.push_back(Pending::Detail(self.scheduler.spawn(candidate, url, permit)))
                }
                None => tracing::warn!("No fetch slot for {}, skipping", candidate.name),
            }
        }

        while let Some(item) = pending.pop_front() {
            self.settle(item, state).await?;
        }

        Ok(())
    }

    /// Turns one pending candidate into a row (or nothing)
    async fn settle(&self, item: Pending, state: &mut CrawlState) -> Result<()> {
        let (candidate, outcome) = match item {
            Pending::ListingOnly(candidate) => {
                self.commit(listing_only_record(&candidate), state);
                return Ok(());
            }
            Pending::Detail(fetch) => fetch.finish().await?,
        };

        if outcome.was_requested() {
            state.note_detail_fetch();
        }
        self.observe_cancel(state);

        match outcome {
            DetailOutcome::Extracted(fields) => {
                if let Some(strategy) = fields.phone_strategy {
                    tracing::debug!("Phone for {} found by {}", candidate.name, strategy);
                }
                let record = assemble_record(&candidate, fields, self.mode, state.state_code());
                self.commit(record, state);
            }
            DetailOutcome::Failed(e) => {
                state.note_detail_failure();
                tracing::warn!("Skipping {}: {}", candidate.name, e);
            }
            DetailOutcome::Skipped => {
                state.note_discarded();
            }
        }

        Ok(())
    }

    /// Classifies a row and appends whatever the termination policy allows
    fn commit(&self, record: BusinessRecord, state: &mut CrawlState) {
        if state.is_stopped() {
            state.note_discarded();
            return;
        }

        match state.accept(record) {
            Classification::Record(record) => self.observer.on_record(&record),
            Classification::Placeholder => self.observer.on_record(&BusinessRecord::empty()),
            Classification::Suppressed => {
                tracing::debug!(
                    "Suppressed empty row ({} consecutive)",
                    state.consecutive_empty()
                );
            }
            Classification::Halt => {
                tracing::info!(
                    "{} consecutive empty rows, stopping",
                    state.consecutive_empty()
                );
                self.scheduler.close();
            }
        }
    }

    fn observe_cancel(&self, state: &mut CrawlState) {
        if self.cancel.is_cancelled() {
            state.request_stop(StopReason::UserRequested);
        }
    }
}

/// Runs a complete crawl for one state and waits for it to finish
///
/// Progress is reported through `tracing`. Use
/// [`Harvester`](crate::crawler::Harvester) to observe or stop a crawl while
/// it runs.
///
/// # Example
///
/// ```no_run
/// use tradeline::config::Config;
/// use tradeline::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_crawl(&Config::default(), "ca").await?;
/// println!("{} ({} rows)", outcome.reason, outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, state_code: &str) -> Result<CrawlOutcome> {
    let state_code = normalize_state_code(state_code)?;
    let coordinator = Coordinator::new(config, CancellationToken::new(), Arc::new(LoggingObserver))?;
    let state = CrawlState::new(&state_code, config.crawler.empty_row_threshold);
    coordinator.run(state).await
}
