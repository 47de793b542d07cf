//! Result sinks: append-only destinations for issue records.
//!
//! Pushes arrive from many rayon workers at once, with no ordering guarantee.

use crate::domain::{IssueRecord, Severity};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Destination of a run's issue records.
///
/// Must accept unbounded concurrent callers without losing records.
pub trait ResultSink: Send + Sync {
    fn push(&self, record: IssueRecord);
}

/// In-memory collector (the usual destination group)
#[derive(Debug, Default)]
pub struct IssueCollector {
    records: Mutex<Vec<IssueRecord>>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Snapshot of everything pushed so far
    pub fn records(&self) -> Vec<IssueRecord> {
        self.records.lock().clone()
    }

    /// Drain all records, leaving the collector empty
    pub fn take(&self) -> Vec<IssueRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn by_file(&self) -> BTreeMap<PathBuf, Vec<IssueRecord>> {
        let mut groups: BTreeMap<PathBuf, Vec<IssueRecord>> = BTreeMap::new();
        for record in self.records.lock().iter() {
            groups
                .entry(record.source_file().path.clone())
                .or_default()
                .push(record.clone());
        }
        groups
    }

    pub fn by_category(&self) -> BTreeMap<String, Vec<IssueRecord>> {
        let mut groups: BTreeMap<String, Vec<IssueRecord>> = BTreeMap::new();
        for record in self.records.lock().iter() {
            groups
                .entry(record.provider_category().to_string())
                .or_default()
                .push(record.clone());
        }
        groups
    }

    pub fn count_by_severity(&self) -> SeverityCount {
        let mut count = SeverityCount::default();
        for record in self.records.lock().iter() {
            match record.severity() {
                Severity::Error => count.error += 1,
                Severity::Warning => count.warning += 1,
                Severity::Suggestion => count.suggestion += 1,
                Severity::Hint => count.hint += 1,
                Severity::None => {}
            }
        }
        count
    }
}

impl ResultSink for IssueCollector {
    fn push(&self, record: IssueRecord) {
        self.records.lock().push(record);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeverityCount {
    pub error: usize,
    pub warning: usize,
    pub suggestion: usize,
    pub hint: usize,
}

impl SeverityCount {
    pub fn total(&self) -> usize {
        self.error + self.warning + self.suggestion + self.hint
    }
}

/// Streams records to an async consumer as they are produced.
///
/// Records pushed after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<IssueRecord>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IssueRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn push(&self, record: IssueRecord) {
        if self.tx.send(record).is_err() {
            tracing::debug!("issue receiver dropped, discarding record");
        }
    }
}
