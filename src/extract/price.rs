//! Price and currency

use super::numeric::clean_numeric;
use super::record::DEFAULT_CURRENCY;
use super::selectors::{PRICE_CURRENCY, PRICE_NUMBER};
use super::text::stripped_text;
use scraper::Html;

/// Price fields of one listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceFields {
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Reads price and currency
///
/// The currency element is read whether or not the price parses. PLN is
/// assumed only when that element is missing and a price was parsed.
pub fn extract_price(document: &Html) -> PriceFields {
    let price = document
        .select(&PRICE_NUMBER)
        .next()
        .and_then(|el| clean_numeric(&stripped_text(el)));

    let currency = document
        .select(&PRICE_CURRENCY)
        .next()
        .map(stripped_text)
        .filter(|c| !c.is_empty())
        .or_else(|| price.map(|_| DEFAULT_CURRENCY.to_string()));

    PriceFields { price, currency }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_of(html: &str) -> PriceFields {
        extract_price(&Html::parse_document(html))
    }

    #[test]
    fn test_price_with_currency() {
        let fields = price_of(
            r#"<span class="offer-price__number">45 900</span>
               <span class="offer-price__currency big">EUR</span>"#,
        );
        assert_eq!(fields.price, Some(45900.0));
        assert_eq!(fields.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_default_currency() {
        let fields = price_of(r#"<span class="offer-price__number">93&nbsp;800</span>"#);
        assert_eq!(fields.price, Some(93800.0));
        assert_eq!(fields.currency.as_deref(), Some("PLN"));
    }

    #[test]
    fn test_currency_without_price() {
        let fields = price_of(r#"<span class="offer-price__currency">PLN</span>"#);
        assert_eq!(fields.price, None);
        assert_eq!(fields.currency.as_deref(), Some("PLN"));
    }

    #[test]
    fn test_no_price_no_currency() {
        let fields = price_of("<p>Brak ceny</p>");
        assert_eq!(fields, PriceFields::default());
    }

    #[test]
    fn test_unparsable_price() {
        let fields = price_of(r#"<span class="offer-price__number">Zapytaj</span>"#);
        assert_eq!(fields.price, None);
        assert_eq!(fields.currency, None);
    }

    #[test]
    fn test_unparsable_price_keeps_currency_element() {
        let fields = price_of(
            r#"<span class="offer-price__number">Zapytaj o cenę</span>
               <span class="offer-price__currency">EUR</span>"#,
        );
        assert_eq!(fields.price, None);
        assert_eq!(fields.currency.as_deref(), Some("EUR"));
    }
}
