//! Record sink trait and output errors

use crate::extract::ListingRecord;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur while serializing or delivering a batch
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("Invalid blob container URL: {0}")]
    InvalidContainer(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Delivery counters reported by a sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Records handed to the sink
    pub records_received: u64,

    /// Batches stored in the blob container
    pub batches_uploaded: u64,

    /// Batches written to the local backup directory
    pub batches_saved_locally: u64,

    /// Batches that could be stored nowhere
    pub batches_lost: u64,
}

/// Destination for extracted records
///
/// The harvester pushes every record and calls [`finish`](Self::finish)
/// once at the end of the run. Sinks deal with their own failures; nothing
/// they do changes how the harvest proceeds.
pub trait RecordSink {
    /// Accepts one record
    fn push(&mut self, record: ListingRecord) -> impl Future<Output = ()> + Send;

    /// Flushes whatever is still buffered
    fn finish(&mut self) -> impl Future<Output = ()> + Send;

    /// Counters accumulated so far
    fn report(&self) -> SinkReport;
}
