use serde::Deserialize;

/// Main configuration structure for the harvester
///
/// Every section and field has a default, so an empty file (or no file at
/// all) yields a working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// Outbound HTTP behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Browser user agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Referer header value
    pub referer: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Lower bound of the random pre-request delay (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the random pre-request delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Number of retries after the first attempt for 5xx responses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before retry N is `backoff-base-ms * 2^(N-1)`
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Cap for a single backoff sleep (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Charset label forced onto every response body before parsing
    pub encoding: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referer: "https://www.google.com/".to_string(),
            timeout_secs: 10,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            max_retries: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 120_000,
            encoding: "utf-8".to_string(),
        }
    }
}

/// Pagination and link discovery settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Search results endpoint (without query string)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Value of the `search[order]` query parameter
    #[serde(rename = "sort-order")]
    pub sort_order: String,

    /// Substring an anchor href must contain to count as a listing link
    #[serde(rename = "listing-marker")]
    pub listing_marker: String,

    /// First search page to visit
    #[serde(rename = "start-page")]
    pub start_page: u32,

    /// Number of pages to visit; unbounded when absent
    #[serde(rename = "page-limit")]
    pub page_limit: Option<u32>,

    /// Consecutive empty pages that end the crawl
    #[serde(rename = "empty-page-threshold")]
    pub empty_page_threshold: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.otomoto.pl/osobowe".to_string(),
            sort_order: "created_at_first:desc".to_string(),
            listing_marker: "otomoto.pl/osobowe/oferta/".to_string(),
            start_page: 1,
            page_limit: None,
            empty_page_threshold: 3,
        }
    }
}

/// Batch output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Records per CSV batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Directory for locally saved batches
    #[serde(rename = "backup-dir")]
    pub backup_dir: String,

    /// Blob container URL (with SAS query) batches are uploaded to
    #[serde(rename = "blob-container-url")]
    pub blob_container_url: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            backup_dir: "data_backup".to_string(),
            blob_container_url: None,
        }
    }
}
