//! Consecutive-empty-row termination heuristic
//!
//! Detail pages that yield nothing at all usually mean the directory has run
//! past its real content (or is serving soft-blocked pages). The policy counts
//! such rows in a row and halts the crawl once the run grows past a threshold.
//!
//! | consecutive empty count | action                        |
//! |-------------------------|-------------------------------|
//! | 0 (non-empty record)    | keep the record, reset count  |
//! | 1..=4                   | append a null placeholder row |
//! | 5..=threshold           | append nothing                |
//! | > threshold             | stop the crawl                |

use crate::output::BusinessRecord;
use std::ops::RangeInclusive;

/// Default number of consecutive empty rows tolerated before the crawl halts
pub const DEFAULT_EMPTY_ROW_THRESHOLD: u32 = 8;

/// Consecutive empty counts that still produce a visible placeholder row
pub const PLACEHOLDER_BAND: RangeInclusive<u32> = 1..=4;

/// Whether the crawl may keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Active,
    Stopped,
}

/// What to do with a produced record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Non-empty record: append it
    Record(BusinessRecord),
    /// Empty record inside the placeholder band: append a null row
    Placeholder,
    /// Empty record past the placeholder band: append nothing
    Suppressed,
    /// Threshold exceeded (or already stopped): append nothing, stop crawling
    Halt,
}

/// Counts consecutive empty records and decides when to halt
#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    threshold: u32,
    consecutive_empty: u32,
    state: RunState,
}

impl TerminationPolicy {
    /// Creates an active policy with the given threshold
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_empty: 0,
            state: RunState::Active,
        }
    }

    /// Classifies the next produced record
    ///
    /// `Stopped` is terminal: every call after the halt returns [`Classification::Halt`]
    /// and the counter no longer moves.
    pub fn classify(&mut self, record: BusinessRecord) -> Classification {
        if self.state == RunState::Stopped {
            return Classification::Halt;
        }

        if !record.is_empty() {
            self.consecutive_empty = 0;
            return Classification::Record(record);
        }

        self.consecutive_empty += 1;

        if self.consecutive_empty > self.threshold {
            self.state = RunState::Stopped;
            Classification::Halt
        } else if PLACEHOLDER_BAND.contains(&self.consecutive_empty) {
            Classification::Placeholder
        } else {
            Classification::Suppressed
        }
    }

    /// Current run of consecutive empty records
    pub fn consecutive_empty(&self) -> u32 {
        self.consecutive_empty
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == RunState::Stopped
    }
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EMPTY_ROW_THRESHOLD)
    }
}
