//! Detail fetch scheduling
//!
//! Every detail page is fetched by its own tokio task. A global semaphore
//! bounds how many of those tasks exist at once: the controller acquires a
//! permit before spawning and keeps it inside the [`ScheduledFetch`] until it
//! has classified the result. With a concurrency of 1 this degrades to one
//! fetch at a time, strictly in candidate order.
//!
//! Tasks wait on a fetch gate before issuing their request. Closing the gate
//! keeps tasks that have not yet reached the network from fetching; requests
//! already on the wire are left to finish.

use crate::crawler::fetcher::{fetch_page, FetchError};
use crate::crawler::listing::CandidateBusiness;
use crate::extract::{DetailExtractor, DetailFields};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a detail task produced
#[derive(Debug)]
pub enum DetailOutcome {
    /// The page was fetched and run through the extractor
    Extracted(DetailFields),

    /// The request failed; the candidate is skipped
    Failed(FetchError),

    /// The gate closed before the request was issued
    Skipped,
}

impl DetailOutcome {
    /// Returns true if a request actually went out
    pub fn was_requested(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// A detail fetch in flight, holding its concurrency permit
pub struct ScheduledFetch {
    /// The candidate this fetch belongs to
    pub candidate: CandidateBusiness,

    handle: JoinHandle<DetailOutcome>,

    /// The semaphore permit for this fetch
    _permit: OwnedSemaphorePermit,
}

impl ScheduledFetch {
    /// Waits for the task and releases the permit
    pub async fn finish(self) -> Result<(CandidateBusiness, DetailOutcome), JoinError> {
        let outcome = self.handle.await?;
        Ok((self.candidate, outcome))
    }
}

/// Spawns detail fetch tasks under a global concurrency limit
pub struct DetailScheduler {
    client: Client,
    extractor: Arc<DetailExtractor>,
    semaphore: Arc<Semaphore>,
    download_delay: Duration,
    gate: CancellationToken,
}

impl DetailScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `extractor` - Applied to every fetched page inside the task
    /// * `concurrency` - Maximum number of detail fetches in flight
    /// * `download_delay` - Fixed pause before each request
    /// * `gate` - Once cancelled, no further requests are issued
    pub fn new(
        client: Client,
        extractor: DetailExtractor,
        concurrency: usize,
        download_delay: Duration,
        gate: CancellationToken,
    ) -> Self {
        Self {
            client,
            extractor: Arc::new(extractor),
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            download_delay,
            gate,
        }
    }

    /// Takes a free slot without waiting
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    /// Waits for a free slot
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().acquire_owned().await.ok()
    }

    /// Number of slots currently free
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Spawns the fetch-and-extract task for one candidate
    pub fn spawn(
        &self,
        candidate: CandidateBusiness,
        url: Url,
        permit: OwnedSemaphorePermit,
    ) -> ScheduledFetch {
        tracing::debug!("Scheduling detail fetch for {} ({})", candidate.name, url);

        let client = self.client.clone();
        let extractor = Arc::clone(&self.extractor);
        let gate = self.gate.clone();
        let delay = self.download_delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = gate.cancelled() => return DetailOutcome::Skipped,
                _ = tokio::time::sleep(delay) => {}
            }

            match fetch_page(&client, &url).await {
                Ok(html) => DetailOutcome::Extracted(extractor.extract(&html)),
                Err(e) => DetailOutcome::Failed(e),
            }
        });

        ScheduledFetch {
            candidate,
            handle,
            _permit: permit,
        }
    }

    /// Closes the fetch gate
    pub fn close(&self) {
        self.gate.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.gate.is_cancelled()
    }
}
