use crate::UrlError;
use url::Url;

/// Normalizes a listing href into an absolute URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Resolve the href against `base` (absolute hrefs are kept as-is)
/// 3. Reject anything that is not HTTP or HTTPS
/// 4. Reject URLs without a host
/// 5. Remove fragment (everything after #)
///
/// The query string is kept: two listing URLs that differ only in their
/// query are different listings as far as the harvester is concerned.
///
/// # Examples
///
/// ```
/// use otomoto_harvester::url::normalize_listing_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.otomoto.pl/osobowe").unwrap();
/// let url = normalize_listing_url("/osobowe/oferta/audi-a4-ID6Gx.html#gallery", &base).unwrap();
/// assert_eq!(url.as_str(), "https://www.otomoto.pl/osobowe/oferta/audi-a4-ID6Gx.html");
/// ```
pub fn normalize_listing_url(href: &str, base: &Url) -> Result<Url, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(href.to_string()));
    }

    url.set_fragment(None);

    Ok(url)
}
