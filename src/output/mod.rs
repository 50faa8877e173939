//! Output module for crawl results
//!
//! This module handles:
//! - The fixed-shape business record
//! - The append-only result sink and its snapshots
//! - Crawl statistics and tabular rendering

mod record;
mod sink;
pub mod stats;
mod table;

pub use record::{BusinessRecord, COLUMNS, NOT_AVAILABLE};
pub use sink::{ResultSink, Snapshot, SnapshotReader};
pub use stats::{print_statistics, CrawlStatistics};
pub use table::write_table;
