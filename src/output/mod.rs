//! Output module for extracted listing records
//!
//! This module handles:
//! - Grouping records into CSV batches
//! - Uploading batches to a blob container, with a local fallback
//! - Recording run statistics

mod batch;
mod blob;
mod csv_output;
mod local;
mod memory;
pub mod stats;
mod traits;

pub use batch::BatchSink;
pub use blob::{BlobUploader, BLOB_TYPE_HEADER};
pub use csv_output::{batch_file_name, records_to_csv, UTF8_BOM};
pub use local::LocalBackup;
pub use memory::MemorySink;
pub use stats::{print_statistics, HarvestStats};
pub use traits::{OutputError, OutputResult, RecordSink, SinkReport};
