//! Pagination over search results pages
//!
//! The loop is driven entirely by [`CrawlState`]; this module only performs
//! the fetches and feeds their outcome back into the state.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{FetchFailure, FetchResult, PageSource};
use crate::crawler::links::extract_listing_links;
use crate::state::{CrawlState, DiscoveryPhase, StopReason};
use crate::url::{search_page_url, ListingUrl};
use crate::HarvestError;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of one discovery run
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Deduplicated listing URLs (order not meaningful)
    pub urls: HashSet<ListingUrl>,

    /// Pages attempted, including failed fetches
    pub pages_processed: u32,

    /// Pages whose fetch failed
    pub pages_failed: u32,

    /// Pages fetched without any listing link
    pub pages_empty: u32,

    /// Why pagination ended
    pub stop_reason: StopReason,
}

impl Discovery {
    /// URLs in a stable order, for reproducible processing
    pub fn sorted_urls(&self) -> Vec<ListingUrl> {
        let mut urls: Vec<_> = self.urls.iter().cloned().collect();
        urls.sort();
        urls
    }
}

/// Walks search results pages and collects listing URLs
pub struct LinkDiscoverer<'a, S> {
    source: &'a S,
    base_url: Url,
    sort_order: String,
    listing_marker: String,
    empty_page_threshold: u32,
    cancel: CancellationToken,
}

impl<'a, S: PageSource> LinkDiscoverer<'a, S> {
    /// Creates a discoverer fetching through `source`
    ///
    /// # Returns
    ///
    /// * `Err(HarvestError)` - `config.base_url` is not a valid URL
    pub fn new(source: &'a S, config: &CrawlConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            source,
            base_url: Url::parse(&config.base_url)?,
            sort_order: config.sort_order.clone(),
            listing_marker: config.listing_marker.clone(),
            empty_page_threshold: config.empty_page_threshold,
            cancel: CancellationToken::new(),
        })
    }

    /// Stops discovery before the next page once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs pagination from `start_page`
    ///
    /// Pages are visited one at a time in increasing order until one of:
    /// - `empty_page_threshold` consecutive pages yield no listing links
    /// - `page_limit` pages have been processed (when set)
    /// - the cancellation token fires
    ///
    /// A failed fetch skips the page without counting it as empty.
    pub async fn discover(&self, start_page: u32, page_limit: Option<u32>) -> Discovery {
        let mut state = CrawlState::new(start_page, page_limit, self.empty_page_threshold);

        while let DiscoveryPhase::Fetching(page) = state.phase() {
            if self.cancel.is_cancelled() {
                tracing::info!("Discovery cancelled before page {}", page);
                state.cancel();
                break;
            }

            let url = search_page_url(&self.base_url, &self.sort_order, page);
            tracing::info!("Scraping links from page {}...", page);

            match self.source.fetch_page(url.as_str()).await {
                FetchResult::Success(fetched) => {
                    let page_base = Url::parse(&fetched.url).unwrap_or(url);
                    let links =
                        extract_listing_links(&fetched.body, &page_base, &self.listing_marker);

                    if links.is_empty() {
                        tracing::warn!("No links found on page {}.", page);
                    } else {
                        tracing::info!("Found {} links on page {}.", links.len(), page);
                    }

                    let added = state.record_links(links);
                    tracing::debug!(
                        page,
                        added,
                        total = state.urls().len(),
                        empty_streak = state.consecutive_empty(),
                        "Page merged"
                    );
                    state.advance();
                }
                FetchResult::Failure(FetchFailure::Cancelled) => {
                    tracing::info!("Discovery cancelled while fetching page {}", page);
                    state.cancel();
                }
                FetchResult::Failure(cause) => {
                    tracing::warn!(
                        "Skipping page {} due to connection error: {}",
                        page,
                        cause
                    );
                    state.record_failure();
                }
            }
        }

        let stop_reason = match state.phase() {
            DiscoveryPhase::Stopped(reason) => reason,
            _ => StopReason::Cancelled,
        };

        match stop_reason {
            StopReason::EmptyPages => tracing::info!(
                "{} consecutive empty pages. Stopping pagination.",
                state.consecutive_empty()
            ),
            StopReason::PageLimit => {
                tracing::info!("Page limit reached after {} pages.", state.pages_processed())
            }
            StopReason::Cancelled => {}
        }

        let pages_processed = state.pages_processed();
        let pages_failed = state.pages_failed();
        let pages_empty = state.pages_empty();

        Discovery {
            urls: state.into_urls(),
            pages_processed,
            pages_failed,
            pages_empty,
            stop_reason,
        }
    }
}
