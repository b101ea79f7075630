//! Listing link extraction from search results pages
//!
//! The search page layout and its CSS classes change often, so links are
//! recognised by a path marker in the raw `href` only.

use crate::url::ListingUrl;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts listing URLs from a search results page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - every `<a href="...">` whose raw href contains `marker`
///
/// **Normalize:**
/// - resolve against `base_url`, drop the fragment
///
/// **Exclude:**
/// - hrefs that do not normalize to an HTTP(S) URL
/// - duplicates (first occurrence kept)
///
/// # Example
///
/// ```
/// use otomoto_harvester::crawler::extract_listing_links;
/// use url::Url;
///
/// let html = r#"<a href="https://www.otomoto.pl/osobowe/oferta/fiat-500-ID1.html#x">Fiat</a>"#;
/// let base = Url::parse("https://www.otomoto.pl/osobowe?page=1").unwrap();
/// let links = extract_listing_links(html, &base, "otomoto.pl/osobowe/oferta/");
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://www.otomoto.pl/osobowe/oferta/fiat-500-ID1.html");
/// ```
pub fn extract_listing_links(html: &str, base_url: &Url, marker: &str) -> Vec<ListingUrl> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if !href.contains(marker) {
            continue;
        }

        match ListingUrl::parse(href, base_url) {
            Some(link) => {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
            None => tracing::trace!("Ignoring unparsable listing href: {}", href),
        }
    }

    links
}
