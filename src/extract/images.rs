//! Gallery image URLs

use super::selectors::GALLERY_IMAGE;
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use std::sync::LazyLock;

static GALLERY_TEST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^gallery-image-\d+$").expect("hardcoded regex pattern is valid"));

/// Only absolute HTTPS sources are kept; lazy-load placeholders are not
const ABSOLUTE_URL_MARKER: &str = "https://";

/// Collects gallery image URLs in page order, without duplicates
pub fn extract_image_urls(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();

    document
        .select(&GALLERY_IMAGE)
        .filter(|img| {
            img.value()
                .attr("data-testid")
                .is_some_and(|id| GALLERY_TEST_ID.is_match(id))
        })
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| src.contains(ABSOLUTE_URL_MARKER))
        .filter(|src| seen.insert(*src))
        .map(str::to_string)
        .collect()
}
