//! Technical attribute table

use super::record::{Attribute, AttributeValue, TechnicalAttributes};
use super::selectors::{attribute_container, PARAGRAPH};
use super::text::stripped_text;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Container selector for every catalog entry
static CONTAINERS: LazyLock<Vec<(Attribute, Selector)>> = LazyLock::new(|| {
    Attribute::ALL
        .iter()
        .filter_map(|attribute| {
            attribute_container(attribute.marker()).map(|selector| (*attribute, selector))
        })
        .collect()
});

/// Raw text of one attribute container
///
/// Containers hold a label paragraph and a value paragraph, so with two or
/// more paragraphs the second is the value. A single paragraph is the value
/// itself, and a container without paragraphs contributes its own text.
pub fn container_value(container: ElementRef<'_>) -> String {
    let mut paragraphs = container.select(&PARAGRAPH);
    match (paragraphs.next(), paragraphs.next()) {
        (Some(_), Some(value)) => stripped_text(value),
        (Some(only), None) => stripped_text(only),
        _ => stripped_text(container),
    }
}

/// Reads every catalog entry present on the page
pub fn extract_technical(document: &Html) -> TechnicalAttributes {
    let mut technical = TechnicalAttributes::default();

    for (attribute, selector) in CONTAINERS.iter() {
        let Some(container) = document.select(selector).next() else {
            continue;
        };

        let raw = container_value(container);
        match AttributeValue::from_raw(attribute.kind(), &raw) {
            Some(value) => {
                technical.fill(*attribute, value);
            }
            None => tracing::trace!(
                attribute = attribute.column(),
                raw = raw.as_str(),
                "Attribute value did not survive normalization"
            ),
        }
    }

    technical
}
