//! Text helpers, strategy chains, title and description

use super::selectors::{DESCRIPTION, HEADING, OFFER_TITLE};
use scraper::{ElementRef, Html};

/// One way of finding a field; `None` means "try the next one"
pub type Strategy<T> = fn(&Html) -> Option<T>;

/// Runs `strategies` in order and returns the first present result
pub fn first_present<T>(document: &Html, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(document))
}

/// Trimmed text nodes of `element`, concatenated
///
/// Whitespace between inline elements is dropped, so
/// `<a>00-001 <b>Warszawa</b></a>` reads `00-001Warszawa`.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Trimmed, non-empty text nodes of `element` joined by `separator`
pub fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn title_from_offer_heading(document: &Html) -> Option<String> {
    non_empty(document.select(&OFFER_TITLE).next().map(stripped_text))
}

fn title_from_first_heading(document: &Html) -> Option<String> {
    non_empty(document.select(&HEADING).next().map(stripped_text))
}

const TITLE_STRATEGIES: &[Strategy<String>] = &[title_from_offer_heading, title_from_first_heading];

/// Listing title, if any heading is present
pub fn extract_title(document: &Html) -> Option<String> {
    first_present(document, TITLE_STRATEGIES)
}

/// Listing description, one line per text node; empty when absent
pub fn extract_description(document: &Html) -> String {
    document
        .select(&DESCRIPTION)
        .next()
        .map(|wrapper| joined_text(wrapper, "\n"))
        .unwrap_or_default()
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}
