//! Batching CSV sink with blob upload and local fallback

use crate::config::OutputConfig;
use crate::extract::ListingRecord;
use crate::output::blob::BlobUploader;
use crate::output::csv_output::{batch_file_name, records_to_csv};
use crate::output::local::LocalBackup;
use crate::output::traits::{OutputResult, RecordSink, SinkReport};
use chrono::Local;

/// Groups records into fixed-size CSV batches
///
/// # Delivery Flow
///
/// | Condition | Action |
/// |-----------|--------|
/// | Buffer reaches `batch-size` | Serialize and deliver the batch |
/// | Run ends with records buffered | Deliver the partial batch |
/// | Container configured | `PUT` the batch as a block blob |
/// | No container, or upload failed | Write it under `backup-dir` |
/// | Local write failed too | Log and count the batch as lost |
///
/// Batches are numbered from 1 in delivery order.
pub struct BatchSink {
    batch_size: usize,
    buffer: Vec<ListingRecord>,
    next_batch: u32,
    uploader: Option<BlobUploader>,
    backup: LocalBackup,
    report: SinkReport,
}

impl BatchSink {
    pub fn new(batch_size: usize, uploader: Option<BlobUploader>, backup: LocalBackup) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            next_batch: 1,
            uploader,
            backup,
            report: SinkReport::default(),
        }
    }

    /// Builds the sink described by the `[output]` section
    pub fn from_config(config: &OutputConfig) -> OutputResult<Self> {
        let uploader = match config.blob_container_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Some(BlobUploader::new(url.trim())?),
            _ => {
                tracing::info!(
                    "No blob container configured; batches go to {}",
                    config.backup_dir
                );
                None
            }
        };

        Ok(Self::new(
            config.batch_size,
            uploader,
            LocalBackup::new(&config.backup_dir),
        ))
    }

    /// Records waiting for the next batch
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let records = std::mem::take(&mut self.buffer);
        let batch_number = self.next_batch;
        self.next_batch += 1;

        let name = batch_file_name(&Local::now(), batch_number);
        let bytes = match records_to_csv(&records) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to serialize batch {}: {}", batch_number, e);
                self.report.batches_lost += 1;
                return;
            }
        };

        tracing::info!(
            "Delivering batch {} ({} records, {} bytes)",
            batch_number,
            records.len(),
            bytes.len()
        );

        if let Some(uploader) = &self.uploader {
            match uploader.upload(&name, bytes.clone()).await {
                Ok(()) => {
                    tracing::info!("Uploaded {} to blob storage", name);
                    self.report.batches_uploaded += 1;
                    return;
                }
                Err(e) => {
                    tracing::warn!("Upload of {} failed: {}. Saving locally.", name, e);
                }
            }
        }

        match self.backup.save(&name, &bytes).await {
            Ok(path) => {
                tracing::info!("Saved batch locally: {}", path.display());
                self.report.batches_saved_locally += 1;
            }
            Err(e) => {
                tracing::error!("Failed to save {} locally: {}", name, e);
                self.report.batches_lost += 1;
            }
        }
    }
}

impl RecordSink for BatchSink {
    async fn push(&mut self, record: ListingRecord) {
        self.report.records_received += 1;
        self.buffer.push(record);

        if self.buffer.len() >= self.batch_size {
            self.flush().await;
        }
    }

    async fn finish(&mut self) {
        self.flush().await;
    }

    fn report(&self) -> SinkReport {
        self.report
    }
}
