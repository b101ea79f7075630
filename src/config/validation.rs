use crate::config::types::{Config, CrawlConfig, FetchConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 0 and 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) must not exceed backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if encoding_rs::Encoding::for_label(config.encoding.as_bytes()).is_none() {
        return Err(ConfigError::UnknownEncoding(config.encoding.clone()));
    }

    Ok(())
}

/// Validates pagination configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if config.listing_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "listing_marker cannot be empty".to_string(),
        ));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.page_limit == Some(0) {
        return Err(ConfigError::Validation(
            "page_limit must be >= 1 when set".to_string(),
        ));
    }

    if config.empty_page_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "empty_page_threshold must be >= 1, got {}",
            config.empty_page_threshold
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.backup_dir.is_empty() {
        return Err(ConfigError::Validation(
            "backup_dir cannot be empty".to_string(),
        ));
    }

    // A blank container URL means local backup only
    if let Some(container) = config
        .blob_container_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    {
        validate_http_url("blob_container_url", container)?;
    }

    Ok(())
}

/// Validates that `value` parses as an HTTP(S) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_equal_delay_bounds_allowed() {
        let mut config = Config::default();
        config.fetch.min_delay_ms = 0;
        config.fetch.max_delay_ms = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_inverted_delay_bounds_rejected() {
        let mut config = Config::default();
        config.fetch.min_delay_ms = 3000;
        config.fetch.max_delay_ms = 1000;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_too_many_retries_rejected() {
        let mut config = Config::default();
        config.fetch.max_retries = 11;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let mut config = Config::default();
        config.fetch.encoding = "klingon-8".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_legacy_encoding_label_accepted() {
        let mut config = Config::default();
        config.fetch.encoding = "iso-8859-2".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.crawl.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let mut config = Config::default();
        config.crawl.base_url = "ftp://otomoto.pl/osobowe".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_start_page_rejected() {
        let mut config = Config::default();
        config.crawl.start_page = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_page_limit_rejected() {
        let mut config = Config::default();
        config.crawl.page_limit = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut config = Config::default();
        config.crawl.listing_marker = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = Config::default();
        config.output.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blob_container_url_validated() {
        let mut config = Config::default();
        config.output.blob_container_url = Some("https://acct.blob.core.windows.net/raw-data?sv=1".to_string());
        assert!(validate(&config).is_ok());

        config.output.blob_container_url = Some("raw-data".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_blob_container_url_means_none() {
        let config = parse_config(
            r#"
[output]
blob-container-url = ""
"#,
        )
        .unwrap();
        assert!(validate(&config).is_ok());

        let mut config = Config::default();
        config.output.blob_container_url = Some("   ".to_string());
        assert!(validate(&config).is_ok());
    }
}
