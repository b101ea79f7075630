//! In-memory sink

use crate::extract::ListingRecord;
use crate::output::traits::{RecordSink, SinkReport};

/// Keeps every record in memory
///
/// Handy for short runs inspected from code and for exercising the
/// harvester without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<ListingRecord>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }

    /// Whether the harvester has called `finish`
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RecordSink for MemorySink {
    async fn push(&mut self, record: ListingRecord) {
        self.records.push(record);
    }

    async fn finish(&mut self) {
        self.finished = true;
    }

    fn report(&self) -> SinkReport {
        SinkReport {
            records_received: self.records.len() as u64,
            ..SinkReport::default()
        }
    }
}
