//! URL handling module for the harvester
//!
//! This module provides the [`ListingUrl`] identity type, href normalization
//! and construction of search-results page URLs.

mod normalize;

use std::fmt;
use url::Url;

pub use normalize::normalize_listing_url;

/// Normalized absolute URL of one listing detail page
///
/// Two listing URLs are equal when their normalized strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListingUrl(String);

impl ListingUrl {
    /// Normalizes `href` against `base` and wraps the result
    ///
    /// Returns `None` when the href cannot be turned into an HTTP(S) URL.
    pub fn parse(href: &str, base: &Url) -> Option<Self> {
        normalize_listing_url(href, base)
            .ok()
            .map(|url| Self(url.to_string()))
    }

    /// The normalized URL string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value, returning the URL string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ListingUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListingUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds the URL of one search results page
///
/// The sort order goes into `search[order]`, which the site expects
/// percent-encoded (`search%5Border%5D=created_at_first%3Adesc`). Any query
/// already present on `base` is replaced.
///
/// # Examples
///
/// ```
/// use otomoto_harvester::url::search_page_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.otomoto.pl/osobowe").unwrap();
/// let url = search_page_url(&base, "created_at_first:desc", 3);
/// assert_eq!(
///     url.as_str(),
///     "https://www.otomoto.pl/osobowe?search%5Border%5D=created_at_first%3Adesc&page=3"
/// );
/// ```
pub fn search_page_url(base: &Url, sort_order: &str, page: u32) -> Url {
    let mut url = base.clone();
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("search[order]", sort_order)
        .append_pair("page", &page.to_string());
    url
}
