//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with static browser-like headers
//! - A mandatory random delay before every attempt
//! - Capped exponential backoff retries for 5xx responses
//! - Forcing the configured character encoding onto response bodies
//! - Classifying transport failures

use crate::config::FetchConfig;
use crate::{ConfigError, HarvestError};
use encoding_rs::Encoding;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Status codes that are retried transparently
const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// Body decoded with the forced encoding
    pub body: String,
}

/// Why a fetch produced no page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("HTTP {status} after {attempts} attempts")]
    RetriesExhausted { status: u16, attempts: u32 },

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("cancelled")]
    Cancelled,
}

/// Result of a fetch operation
///
/// Fetching never returns an error to the caller: every transport problem
/// ends up as a [`FetchResult::Failure`] that the caller treats as "page
/// unavailable".
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success(FetchedPage),

    /// The page could not be fetched
    Failure(FetchFailure),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Body text of a successful fetch
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Success(page) => Some(&page.body),
            Self::Failure(_) => None,
        }
    }
}

/// Anything that can turn a URL into a [`FetchResult`]
///
/// The discovery loop and the harvester are generic over this so they can
/// be driven by scripted pages in tests.
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = FetchResult> + Send;
}

/// Builds an HTTP client with the static browser headers
///
/// # Example
///
/// ```no_run
/// use otomoto_harvester::config::FetchConfig;
/// use otomoto_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &config.accept_language)?,
    );
    headers.insert(REFERER, header_value("referer", &config.referer)?);

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value)
        .map_err(|_| ConfigError::Validation(format!("{} is not a valid header value", name)))
}

/// Polite HTTP client shared by discovery and listing fetches
///
/// # Request Flow
///
/// | Condition | Action |
/// |-----------|--------|
/// | Every attempt | Sleep a random delay from `[min-delay-ms, max-delay-ms]` first |
/// | HTTP 2xx | Decode body with the forced encoding → Success |
/// | HTTP 500/502/503/504 | Back off, retry up to `max-retries` times |
/// | Retries exhausted | → RetriesExhausted |
/// | Other HTTP status | Immediate → Status |
/// | Timeout | Immediate → Timeout |
/// | Connection error | Immediate → Connect |
/// | Cancellation during a sleep | Immediate → Cancelled |
pub struct FetchClient {
    client: Client,
    config: FetchConfig,
    encoding: &'static Encoding,
    cancel: CancellationToken,
}

impl FetchClient {
    /// Creates a client from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, HarvestError> {
        let encoding = Encoding::for_label(config.encoding.as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(config.encoding.clone()))?;

        Ok(Self {
            client: build_http_client(config)?,
            config: config.clone(),
            encoding,
            cancel: CancellationToken::new(),
        })
    }

    /// Makes every sleep of this client end early once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetches a URL with the politeness delay and retry logic
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let attempts = self.config.max_retries + 1;
        let mut last_status = 0;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = self.backoff_delay(attempt);
                tracing::debug!(
                    url,
                    attempt,
                    delay_ms = backoff.as_millis() as u64,
                    "Backing off before retry"
                );
                if !self.sleep_or_cancel(backoff).await {
                    return FetchResult::Failure(FetchFailure::Cancelled);
                }
            }

            if !self.sleep_or_cancel(self.politeness_delay()).await {
                return FetchResult::Failure(FetchFailure::Cancelled);
            }

            tracing::trace!(url, attempt, "Sending GET");

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    let failure = classify_error(&e);
                    tracing::error!("Failed to fetch {}: {}", url, failure);
                    return FetchResult::Failure(failure);
                }
            };

            let status = response.status();
            if status.is_success() {
                return self.read_page(response).await;
            }

            if is_retryable(status) {
                last_status = status.as_u16();
                tracing::warn!(
                    "HTTP {} from {} (attempt {}/{})",
                    last_status,
                    url,
                    attempt + 1,
                    attempts
                );
                continue;
            }

            tracing::error!("Failed to fetch {}: HTTP {}", url, status.as_u16());
            return FetchResult::Failure(FetchFailure::Status(status.as_u16()));
        }

        tracing::error!(
            "Failed to fetch {}: HTTP {} after {} attempts",
            url,
            last_status,
            attempts
        );
        FetchResult::Failure(FetchFailure::RetriesExhausted {
            status: last_status,
            attempts,
        })
    }

    /// Random delay applied before every attempt
    pub fn politeness_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.config.min_delay_ms..=self.config.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Backoff before retry number `retry` (1-based)
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let ms = self
            .config
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.config.backoff_max_ms);
        Duration::from_millis(ms)
    }

    /// Sleeps for `duration`; returns false if cancelled first
    async fn sleep_or_cancel(&self, duration: Duration) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn read_page(&self, response: Response) -> FetchResult {
        let url = response.url().to_string();
        let status_code = response.status().as_u16();
        let headers = response.headers().clone();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to read body of {}: {}", url, e);
                return FetchResult::Failure(FetchFailure::Body(e.to_string()));
            }
        };

        let (body, had_errors) = self.encoding.decode_with_bom_removal(&bytes);
        if had_errors {
            tracing::debug!(
                "Body of {} contained bytes invalid in {}",
                url,
                self.encoding.name()
            );
        }

        FetchResult::Success(FetchedPage {
            url,
            status_code,
            headers,
            body: body.into_owned(),
        })
    }
}

impl PageSource for FetchClient {
    async fn fetch_page(&self, url: &str) -> FetchResult {
        self.fetch(url).await
    }
}

fn is_retryable(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Connect(e.to_string())
    } else if e.is_body() || e.is_decode() {
        FetchFailure::Body(e.to_string())
    } else {
        FetchFailure::Request(e.to_string())
    }
}
