//! Harvest coordinator - main orchestration logic
//!
//! This module ties the pipeline together:
//! - Discovering listing URLs page by page
//! - Fetching every listing sequentially
//! - Extracting records and handing them to the sink
//! - Honoring cancellation at every fetch boundary
//! - Collecting run statistics

use crate::config::{Config, CrawlConfig};
use crate::crawler::discovery::LinkDiscoverer;
use crate::crawler::fetcher::{FetchClient, PageSource};
use crate::extract::FieldExtractor;
use crate::output::{BatchSink, HarvestStats, RecordSink};
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Progress is logged every this many listings
const PROGRESS_INTERVAL: u64 = 10;

/// Main harvest coordinator
///
/// Owns all mutable run state. One request is in flight at a time; the
/// fetcher's politeness delay is the only rate control.
pub struct Harvester<S, K> {
    source: S,
    sink: K,
    crawl: CrawlConfig,
    extractor: FieldExtractor,
    cancel: CancellationToken,
}

impl<S: PageSource, K: RecordSink> Harvester<S, K> {
    /// Creates a harvester reading through `source` and writing into `sink`
    pub fn new(source: S, sink: K, crawl: &CrawlConfig) -> Self {
        Self {
            source,
            sink,
            crawl: crawl.clone(),
            extractor: FieldExtractor::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Ends the run early once `token` is cancelled
    ///
    /// Whatever was extracted before cancellation is still flushed to the
    /// sink.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Consumes the harvester, returning the sink
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Runs discovery followed by listing extraction
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestStats)` - The run finished, completely or after cancellation
    /// * `Err(HarvestError)` - The crawl configuration is unusable; nothing was fetched
    pub async fn run(&mut self) -> Result<HarvestStats, HarvestError> {
        let mut stats = HarvestStats::new();

        tracing::info!(
            "Starting harvest at page {} ({})",
            self.crawl.start_page,
            match self.crawl.page_limit {
                Some(limit) => format!("up to {} pages", limit),
                None => "until results run out".to_string(),
            }
        );

        let discovery = {
            let discoverer = LinkDiscoverer::new(&self.source, &self.crawl)?
                .with_cancellation(self.cancel.clone());
            discoverer
                .discover(self.crawl.start_page, self.crawl.page_limit)
                .await
        };
        stats.record_discovery(&discovery);

        let urls = discovery.sorted_urls();
        tracing::info!("Total unique links found: {}", urls.len());

        let start_time = std::time::Instant::now();
        let mut attempted: u64 = 0;

        for link in &urls {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "Cancelled with {} of {} listings processed",
                    attempted,
                    urls.len()
                );
                stats.cancelled = true;
                break;
            }

            tracing::debug!("Processing listing: {}", link);
            let fetched = self.source.fetch_page(link.as_str()).await;
            attempted += 1;

            match self.extractor.extract(link, &fetched) {
                Some(record) => {
                    stats.listings_fetched += 1;
                    self.sink.push(record).await;
                    stats.records_emitted += 1;
                }
                None => {
                    stats.listings_failed += 1;
                    tracing::warn!("Skipping listing {}", link);
                }
            }

            if attempted % PROGRESS_INTERVAL == 0 {
                let rate = attempted as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} listings, {} records, {:.2} listings/sec",
                    attempted,
                    urls.len(),
                    stats.records_emitted,
                    rate
                );
            }
        }

        self.sink.finish().await;
        stats.record_sink(self.sink.report());
        stats.finish();

        tracing::info!(
            "Harvest completed: {} records from {} listings in {:?}",
            stats.records_emitted,
            attempted,
            start_time.elapsed()
        );

        Ok(stats)
    }
}

/// Runs a complete harvest with the default HTTP client and batch sink
///
/// # Example
///
/// ```no_run
/// use otomoto_harvester::config::Config;
/// use otomoto_harvester::crawler::run_harvest;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stats = run_harvest(&Config::default(), CancellationToken::new()).await?;
/// println!("{} records", stats.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: &Config,
    cancel: CancellationToken,
) -> Result<HarvestStats, HarvestError> {
    let client = FetchClient::new(&config.fetch)?.with_cancellation(cancel.clone());
    let sink = BatchSink::from_config(&config.output)?;

    let mut harvester = Harvester::new(client, sink, &config.crawl).with_cancellation(cancel);
    harvester.run().await
}
