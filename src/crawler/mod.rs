//! Crawler module for search pagination and listing retrieval
//!
//! This module contains the core harvesting logic, including:
//! - Polite HTTP fetching with retry logic
//! - Listing link extraction from search pages
//! - The pagination loop with its early-stop rule
//! - Overall harvest coordination

mod coordinator;
mod discovery;
mod fetcher;
mod links;

pub use coordinator::{run_harvest, Harvester};
pub use discovery::{Discovery, LinkDiscoverer};
pub use fetcher::{
    build_http_client, FetchClient, FetchFailure, FetchResult, FetchedPage, PageSource,
};
pub use links::extract_listing_links;
