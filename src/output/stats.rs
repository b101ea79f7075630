//! Run statistics
//!
//! Counters are filled in by the harvester as it goes and printed once the
//! run is over.

use crate::crawler::Discovery;
use crate::output::traits::SinkReport;
use crate::state::StopReason;
use chrono::{DateTime, Utc};

/// Counters for one harvest run
#[derive(Debug, Clone)]
pub struct HarvestStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Search pages attempted, including failed fetches
    pub pages_processed: u64,
    pub pages_failed: u64,

    /// Search pages fetched without any listing link
    pub empty_pages: u64,

    /// Distinct listing URLs found during discovery
    pub links_discovered: u64,

    /// Why discovery ended
    pub stop_reason: Option<StopReason>,

    pub listings_fetched: u64,
    pub listings_failed: u64,
    pub records_emitted: u64,

    pub batches_uploaded: u64,
    pub batches_saved_locally: u64,
    pub batches_lost: u64,

    /// Whether the run was cut short by cancellation
    pub cancelled: bool,
}

impl Default for HarvestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestStats {
    /// Starts the clock for a new run
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_processed: 0,
            pages_failed: 0,
            empty_pages: 0,
            links_discovered: 0,
            stop_reason: None,
            listings_fetched: 0,
            listings_failed: 0,
            records_emitted: 0,
            batches_uploaded: 0,
            batches_saved_locally: 0,
            batches_lost: 0,
            cancelled: false,
        }
    }

    /// Takes over the discovery counters
    pub fn record_discovery(&mut self, discovery: &Discovery) {
        self.pages_processed = discovery.pages_processed.into();
        self.pages_failed = discovery.pages_failed.into();
        self.empty_pages = discovery.pages_empty.into();
        self.links_discovered = discovery.urls.len() as u64;
        self.stop_reason = Some(discovery.stop_reason);
        if discovery.stop_reason == StopReason::Cancelled {
            self.cancelled = true;
        }
    }

    /// Takes over the sink delivery counters
    pub fn record_sink(&mut self, report: SinkReport) {
        self.batches_uploaded = report.batches_uploaded;
        self.batches_saved_locally = report.batches_saved_locally;
        self.batches_lost = report.batches_lost;
    }

    /// Stops the clock
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of attempted listings that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.listings_fetched + self.listings_failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.records_emitted as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStats) {
    println!("=== Harvest Statistics ===\n");

    println!("Run:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(secs) = stats.duration_seconds() {
        println!("  Duration: {}s", secs);
    }
    if stats.cancelled {
        println!("  Cancelled before completion");
    }
    println!();

    println!("Discovery:");
    println!("  Search pages processed: {}", stats.pages_processed);
    println!("  Search pages failed: {}", stats.pages_failed);
    println!("  Empty pages: {}", stats.empty_pages);
    println!("  Listing links discovered: {}", stats.links_discovered);
    if let Some(reason) = stats.stop_reason {
        println!("  Stopped because: {}", reason);
    }
    println!();

    println!("Listings:");
    println!("  Fetched: {}", stats.listings_fetched);
    println!("  Failed: {}", stats.listings_failed);
    println!("  Records emitted: {}", stats.records_emitted);
    println!();

    println!("Output:");
    println!("  Batches uploaded: {}", stats.batches_uploaded);
    println!("  Batches saved locally: {}", stats.batches_saved_locally);
    if stats.batches_lost > 0 {
        println!("  Batches lost: {}", stats.batches_lost);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} listings)",
        stats.success_rate(),
        stats.records_emitted,
        stats.listings_fetched + stats.listings_failed
    );
}
