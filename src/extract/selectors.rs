//! CSS selectors for listing detail pages

use scraper::Selector;
use std::sync::LazyLock;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hardcoded selector is valid")
}

pub static OFFER_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h1.offer-title"));
pub static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
pub static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[data-testid="textWrapper"]"#));

pub static PRICE_NUMBER: LazyLock<Selector> =
    LazyLock::new(|| selector("span.offer-price__number"));
pub static PRICE_CURRENCY: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class*="offer-price__currency"]"#));

pub static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
pub static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));

pub static GALLERY_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img[data-testid]"));

/// Builds the selector of a technical attribute container
pub fn attribute_container(marker: &str) -> Option<Selector> {
    Selector::parse(&format!(r#"div[data-testid="{}"]"#, marker)).ok()
}
