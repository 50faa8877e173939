//! Append-only result collection with point-in-time snapshots
//!
//! The crawl controller is the only writer. Readers (progress displays, the
//! CLI poll loop) hold a [`SnapshotReader`] and copy out an immutable
//! [`Snapshot`] whenever they like. Each append publishes a whole new version
//! of the list, so a reader sees either the list before the append or after
//! it, never a half-written row.

use crate::output::record::BusinessRecord;
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable point-in-time copy of the accumulated records
pub type Snapshot = Arc<Vec<BusinessRecord>>;

/// Write side of the result list
#[derive(Debug)]
pub struct ResultSink {
    tx: watch::Sender<Snapshot>,
}

/// Read side of the result list
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Snapshot>,
}

impl ResultSink {
    /// Creates an empty sink
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Appends a record
    ///
    /// Published versions already handed out to readers are left untouched;
    /// the writer copies on write only while a reader still holds one.
    pub fn append(&self, record: BusinessRecord) {
        self.tx
            .send_modify(|records| Arc::make_mut(records).push(record));
    }

    /// Number of records appended so far
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Returns true if nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a new reader attached to this sink
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Copies the current contents out
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotReader {
    /// Returns the most recently published version of the result list
    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Number of records in the most recently published version
    pub fn len(&self) -> usize {
        self.rx.borrow().len()
    }

    /// Returns true if the most recently published version is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
