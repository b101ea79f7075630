//! Batch upload to a blob storage container
//!
//! The container is addressed by its URL, usually carrying a SAS token in
//! the query string. Each batch becomes one block blob created with a
//! single `PUT`.

use crate::output::traits::{OutputError, OutputResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Header selecting the blob type on creation
pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

const BLOCK_BLOB: &str = "BlockBlob";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Uploads CSV batches into one container
#[derive(Debug, Clone)]
pub struct BlobUploader {
    client: Client,
    container: Url,
}

impl BlobUploader {
    /// Creates an uploader for `container_url`
    ///
    /// # Returns
    ///
    /// * `Err(OutputError::InvalidContainer)` - not an absolute HTTP(S) URL
    pub fn new(container_url: &str) -> OutputResult<Self> {
        let container = Url::parse(container_url)
            .map_err(|e| OutputError::InvalidContainer(format!("{}: {}", container_url, e)))?;

        if !matches!(container.scheme(), "http" | "https") || container.cannot_be_a_base() {
            return Err(OutputError::InvalidContainer(container_url.to_string()));
        }

        let client = Client::builder().timeout(UPLOAD_TIMEOUT).build()?;

        Ok(Self { client, container })
    }

    /// URL of blob `name` inside the container, keeping the container query
    pub fn blob_url(&self, name: &str) -> OutputResult<Url> {
        let mut url = self.container.clone();
        url.path_segments_mut()
            .map_err(|_| OutputError::InvalidContainer(self.container.to_string()))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    /// Stores `bytes` as blob `name`, replacing any blob of that name
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> OutputResult<()> {
        let url = self.blob_url(name)?;
        let size = bytes.len();

        let response = self
            .client
            .put(url)
            .header(BLOB_TYPE_HEADER, BLOCK_BLOB)
            .header(CONTENT_TYPE, CSV_CONTENT_TYPE)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OutputError::Upload(format!("HTTP {} for {}", status.as_u16(), name)));
        }

        tracing::debug!(blob = name, bytes = size, "Blob stored");
        Ok(())
    }
}
