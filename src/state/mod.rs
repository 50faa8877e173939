//! Crawl state and the rules that mutate it
//!
//! # Components
//!
//! - `CrawlState`: the single owner of everything a run accumulates
//! - `DedupSet`: business names already admitted
//! - `TerminationPolicy`: the consecutive-empty-row state machine
//! - `StopReason`: coarse reason surfaced when a run ends

mod crawl_state;
mod dedup;
mod termination;

pub use crawl_state::{CrawlState, StopReason};
pub use dedup::DedupSet;
pub use termination::{
    Classification, RunState, TerminationPolicy, DEFAULT_EMPTY_ROW_THRESHOLD, PLACEHOLDER_BAND,
};
