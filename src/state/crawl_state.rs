//! Discovery state machine for one pagination run
//!
//! All counters the early-stop rule depends on live here, so the rule can
//! be exercised without any network access.

use crate::url::ListingUrl;
use std::collections::HashSet;
use std::fmt;

/// Why a discovery run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Too many consecutive pages yielded no listing links
    EmptyPages,

    /// The requested number of pages has been processed
    PageLimit,

    /// The caller cancelled the run
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPages => "empty_pages",
            Self::PageLimit => "page_limit",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of the discovery loop after the most recent transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    /// The given search page is the next one to fetch
    Fetching(u32),

    /// The last fetched page had no listing links
    PageEmpty,

    /// The last fetched page had at least one listing link
    PageNonEmpty,

    /// Terminal: no more pages will be fetched
    Stopped(StopReason),
}

impl DiscoveryPhase {
    /// Returns true once the run has ended
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }
}

/// Run-scoped pagination state owned by the link discoverer
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Next page to fetch
    page: u32,

    /// Pages yielding nothing, in a row
    consecutive_empty: u32,

    /// Pages attempted so far, including failed fetches
    pages_processed: u32,

    /// Pages whose fetch failed
    pages_failed: u32,

    /// Successfully fetched pages without listing links
    pages_empty: u32,

    /// Listing URLs found so far
    urls: HashSet<ListingUrl>,

    page_limit: Option<u32>,
    empty_page_threshold: u32,
    phase: DiscoveryPhase,
}

impl CrawlState {
    /// Creates the state for a run starting at `start_page`
    ///
    /// A `page_limit` of `None` means the run only ends through the
    /// empty-page rule or cancellation.
    pub fn new(start_page: u32, page_limit: Option<u32>, empty_page_threshold: u32) -> Self {
        let phase = if page_limit == Some(0) {
            DiscoveryPhase::Stopped(StopReason::PageLimit)
        } else {
            DiscoveryPhase::Fetching(start_page)
        };

        Self {
            page: start_page,
            consecutive_empty: 0,
            pages_processed: 0,
            pages_failed: 0,
            pages_empty: 0,
            urls: HashSet::new(),
            page_limit,
            empty_page_threshold: empty_page_threshold.max(1),
            phase,
        }
    }

    pub fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn consecutive_empty(&self) -> u32 {
        self.consecutive_empty
    }

    pub fn pages_processed(&self) -> u32 {
        self.pages_processed
    }

    pub fn pages_failed(&self) -> u32 {
        self.pages_failed
    }

    pub fn pages_empty(&self) -> u32 {
        self.pages_empty
    }

    pub fn urls(&self) -> &HashSet<ListingUrl> {
        &self.urls
    }

    /// Records a page whose fetch failed
    ///
    /// A transport failure says nothing about whether the catalog ended, so
    /// the empty-page counter is left alone. The page still counts towards
    /// the page limit.
    pub fn record_failure(&mut self) -> DiscoveryPhase {
        self.pages_failed += 1;
        self.finish_page()
    }

    /// Records the listing links found on a successfully fetched page
    ///
    /// Returns the number of links that were not already known.
    pub fn record_links<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = ListingUrl>,
    {
        let before = self.urls.len();
        let mut found_any = false;

        for link in links {
            found_any = true;
            self.urls.insert(link);
        }

        if found_any {
            self.consecutive_empty = 0;
            self.phase = DiscoveryPhase::PageNonEmpty;
        } else {
            self.consecutive_empty += 1;
            self.pages_empty += 1;
            self.phase = DiscoveryPhase::PageEmpty;
        }

        self.urls.len() - before
    }

    /// Closes the current page and moves to the next one or to `Stopped`
    ///
    /// Call after [`record_links`](Self::record_links); failed pages go
    /// through [`record_failure`](Self::record_failure) instead.
    pub fn advance(&mut self) -> DiscoveryPhase {
        self.finish_page()
    }

    /// Marks the run as cancelled
    pub fn cancel(&mut self) -> DiscoveryPhase {
        self.phase = DiscoveryPhase::Stopped(StopReason::Cancelled);
        self.phase
    }

    /// Consumes the state, returning the collected URLs
    pub fn into_urls(self) -> HashSet<ListingUrl> {
        self.urls
    }

    fn finish_page(&mut self) -> DiscoveryPhase {
        self.pages_processed += 1;

        self.phase = if self.consecutive_empty >= self.empty_page_threshold {
            DiscoveryPhase::Stopped(StopReason::EmptyPages)
        } else if self
            .page_limit
            .is_some_and(|limit| self.pages_processed >= limit)
        {
            DiscoveryPhase::Stopped(StopReason::PageLimit)
        } else if let Some(next) = self.page.checked_add(1) {
            self.page = next;
            DiscoveryPhase::Fetching(next)
        } else {
            // No page numbers left to request
            DiscoveryPhase::Stopped(StopReason::PageLimit)
        };

        self.phase
    }
}
