//! State module for tracking discovery progress
//!
//! # Components
//!
//! - `CrawlState`: run-scoped pagination counters and the collected listing URLs
//! - `DiscoveryPhase`: where the discovery loop currently is
//! - `StopReason`: why a discovery run ended

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlState, DiscoveryPhase, StopReason};
