//! Listing page extraction
//!
//! Turns the markup of one listing detail page into a [`ListingRecord`].
//! Every field family is read by an ordered list of strategies and a field
//! that cannot be found is left null; extraction itself never fails.

mod images;
mod location;
mod numeric;
mod price;
mod record;
mod selectors;
mod technical;
mod text;

pub use images::extract_image_urls;
pub use location::{
    clean_place_name, extract_location, known_region, parse_location, raw_location,
    LocationFields, MAP_LINK_PHRASE,
};
pub use numeric::{clean_numeric, normalize_yes_no, Flag};
pub use price::{extract_price, PriceFields};
pub use record::{
    Attribute, AttributeKind, AttributeValue, ListingRecord, TechnicalAttributes,
    DEFAULT_CURRENCY, IMAGE_URL_SEPARATOR, UNKNOWN_TITLE,
};
pub use technical::{container_value, extract_technical};
pub use text::{extract_description, extract_title, first_present, Strategy};

use crate::crawler::FetchResult;
use crate::url::ListingUrl;
use record::fill_slot;
use scraper::Html;

/// Builds [`ListingRecord`] values from fetched listing pages
///
/// Fields are assembled in a fixed order: link, title, description and
/// images first, then price, location and the technical table. A later step
/// never overwrites a value an earlier step already set.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts a record from a fetch outcome
    ///
    /// Returns `None` when the fetch failed.
    pub fn extract(&self, link: &ListingUrl, fetched: &FetchResult) -> Option<ListingRecord> {
        let body = fetched.body()?;
        Some(self.extract_html(link.as_str(), body))
    }

    /// Extracts a record from listing markup
    ///
    /// # Example
    ///
    /// ```
    /// use otomoto_harvester::extract::FieldExtractor;
    ///
    /// let html = r#"<h1 class="offer-title">Fiat 500</h1>
    ///     <span class="offer-price__number">32 500</span>"#;
    /// let record = FieldExtractor::new().extract_html("https://www.otomoto.pl/osobowe/oferta/x.html", html);
    /// assert_eq!(record.title, "Fiat 500");
    /// assert_eq!(record.price, Some(32500.0));
    /// assert_eq!(record.currency.as_deref(), Some("PLN"));
    /// ```
    pub fn extract_html(&self, link: &str, html: &str) -> ListingRecord {
        let document = Html::parse_document(html);
        let mut record = ListingRecord::new(link);

        if let Some(title) = extract_title(&document) {
            record.title = title;
        }
        record.description = extract_description(&document);
        record.image_urls = extract_image_urls(&document);

        let price = extract_price(&document);
        fill_option(&mut record.price, price.price);
        fill_option(&mut record.currency, price.currency);

        let location = extract_location(&document);
        fill_option(&mut record.location_city, location.city);
        fill_option(&mut record.location_district, location.district);
        fill_option(&mut record.location_voivodeship, location.voivodeship);

        record.technical = extract_technical(&document);

        tracing::debug!(
            link,
            price = ?record.price,
            city = ?record.location_city,
            images = record.image_urls.len(),
            attributes = record.technical.present_count(),
            "Extracted listing"
        );

        record
    }
}

fn fill_option<T>(slot: &mut Option<T>, value: Option<T>) {
    if let Some(value) = value {
        fill_slot(slot, value);
    }
}
