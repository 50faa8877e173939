//! Crawler module for listing traversal and detail fetching
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed header set and timeout
//! - Listing page parsing into candidate businesses
//! - Bounded-concurrency scheduling of detail fetches
//! - Overall crawl coordination and the start/stop control surface

mod coordinator;
mod fetcher;
mod harvester;
mod listing;
mod observer;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, fetch_page, FetchError};
pub use harvester::Harvester;
pub use listing::{CandidateBusiness, ListingFields, ListingParser, MIN_NAME_LEN};
pub use observer::{CrawlObserver, LoggingObserver, NoopObserver, PageReport, StopHandle};
pub use scheduler::{DetailOutcome, DetailScheduler, ScheduledFetch};
