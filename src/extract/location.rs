//! Seller location: city, district and voivodeship
//!
//! The location block has no stable markup of its own. It is found through
//! the "Znajdź na mapie" (show on map) paragraph that sits next to it, then
//! split on commas. A postal code, when present, pins down the city.

use super::selectors::{ANCHOR, PARAGRAPH};
use super::text::stripped_text;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

/// Text of the paragraph next to the location block
pub const MAP_LINK_PHRASE: &str = "Znajdź na mapie";

/// Paragraph fallback must be longer than this many characters
const MIN_PARAGRAPH_CHARS: usize = 3;

static POSTAL_CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}-\d{3})\s+([^,]+)").expect("hardcoded regex pattern is valid")
});
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}-\d{3}").expect("hardcoded regex pattern is valid"));
static COUNTRY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\W_]*Polska\b\s*[-–]?\s*").expect("hardcoded regex pattern is valid")
});
static EDGE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\W_]+|[\W_]+$").expect("hardcoded regex pattern is valid"));
static DASH_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*[-–]\s*(.+)$").expect("hardcoded regex pattern is valid")
});

/// Voivodeship of the biggest cities, applied over whatever the page says
const KNOWN_CITY_REGIONS: &[(&str, &str)] = &[
    ("Warszawa", "Mazowieckie"),
    ("Kraków", "Małopolskie"),
    ("Łódź", "Łódzkie"),
    ("Wrocław", "Dolnośląskie"),
    ("Poznań", "Wielkopolskie"),
    ("Gdańsk", "Pomorskie"),
    ("Szczecin", "Zachodniopomorskie"),
    ("Bydgoszcz", "Kujawsko-pomorskie"),
    ("Lublin", "Lubelskie"),
    ("Białystok", "Podlaskie"),
    ("Katowice", "Śląskie"),
    ("Gdynia", "Pomorskie"),
    ("Częstochowa", "Śląskie"),
    ("Radom", "Mazowieckie"),
    ("Rzeszów", "Podkarpackie"),
    ("Toruń", "Kujawsko-pomorskie"),
    ("Sosnowiec", "Śląskie"),
    ("Kielce", "Świętokrzyskie"),
    ("Gliwice", "Śląskie"),
    ("Olsztyn", "Warmińsko-mazurskie"),
    ("Zielona Góra", "Lubuskie"),
    ("Opole", "Opolskie"),
];

/// Location fields of one listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFields {
    pub city: Option<String>,
    pub district: Option<String>,
    pub voivodeship: Option<String>,
}

/// Finds and parses the location block; all fields null when it is missing
pub fn extract_location(document: &Html) -> LocationFields {
    match raw_location(document) {
        Some(raw) => parse_location(&raw),
        None => LocationFields::default(),
    }
}

type SectionStrategy = fn(ElementRef<'_>) -> Option<String>;

const SECTION_STRATEGIES: &[SectionStrategy] = &[location_from_link, location_from_paragraph];

/// Raw location text next to the map paragraph
pub fn raw_location(document: &Html) -> Option<String> {
    let section = map_section(document)?;
    SECTION_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(section))
}

/// Nearest `div` around the "Znajdź na mapie" paragraph
fn map_section(document: &Html) -> Option<ElementRef<'_>> {
    let anchor = document
        .select(&PARAGRAPH)
        .find(|p| stripped_text(*p).contains(MAP_LINK_PHRASE))?;

    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")
}

fn location_from_link(section: ElementRef<'_>) -> Option<String> {
    section
        .select(&ANCHOR)
        .next()
        .map(stripped_text)
        .filter(|text| !text.is_empty())
}

fn location_from_paragraph(section: ElementRef<'_>) -> Option<String> {
    section
        .select(&PARAGRAPH)
        .map(stripped_text)
        .find(|text| !text.contains(MAP_LINK_PHRASE) && text.chars().count() > MIN_PARAGRAPH_CHARS)
}

/// Splits raw location text into city, district and voivodeship
///
/// # Rules
///
/// With a postal code (`30-001 Kraków`), the city is the text after the
/// code and doubles as the district. The last comma segment is the
/// voivodeship unless it just repeats the city. With three or more
/// segments, the second-to-last one is the district when it differs from
/// the city.
///
/// Without a postal code:
///
/// | Segments | city | district | voivodeship |
/// |----------|------|----------|-------------|
/// | 3+ | first | second | last |
/// | 2 | first | first | last |
/// | 1 | - | - | that segment |
///
/// Known big cities then override the voivodeship.
///
/// # Examples
///
/// ```
/// use otomoto_harvester::extract::parse_location;
///
/// let fields = parse_location("ul. Długa 5, 31-146 Kraków, Małopolskie");
/// assert_eq!(fields.city.as_deref(), Some("Kraków"));
/// assert_eq!(fields.district.as_deref(), Some("Kraków"));
/// assert_eq!(fields.voivodeship.as_deref(), Some("Małopolskie"));
/// ```
pub fn parse_location(raw: &str) -> LocationFields {
    let parts: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let mut fields = match POSTAL_CITY.captures(raw) {
        Some(caps) => from_postal_code(caps[2].trim(), &parts),
        None => from_segments(&parts),
    };

    if let Some(region) = fields.city.as_deref().and_then(known_region) {
        fields.voivodeship = Some(region.to_string());
    }

    fields
}

fn from_postal_code(after_code: &str, parts: &[&str]) -> LocationFields {
    let city = clean_place_name(after_code);

    let voivodeship = parts
        .last()
        .and_then(|last| clean_place_name(last))
        .filter(|region| !same_place(Some(region.as_str()), city.as_deref()));

    let district = match parts.len() {
        n if n >= 3 => clean_place_name(parts[n - 2])
            .filter(|d| !same_place(Some(d.as_str()), city.as_deref()))
            .or_else(|| city.clone()),
        _ => city.clone(),
    };

    LocationFields {
        city,
        district,
        voivodeship,
    }
}

fn from_segments(parts: &[&str]) -> LocationFields {
    match parts {
        [] => LocationFields::default(),
        [only] => LocationFields {
            voivodeship: clean_place_name(only),
            ..LocationFields::default()
        },
        [first, last] => {
            let city = clean_place_name(first);
            LocationFields {
                district: city.clone(),
                city,
                voivodeship: clean_place_name(last),
            }
        }
        [first, second, .., last] => LocationFields {
            city: clean_place_name(first),
            district: clean_place_name(second),
            voivodeship: clean_place_name(last),
        },
    }
}

fn same_place(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

/// Strips postal codes, the country name and stray punctuation
///
/// `"Kraków - Kraków"` collapses to `"Kraków"`. Returns `None` when nothing
/// is left.
pub fn clean_place_name(text: &str) -> Option<String> {
    let text = POSTAL_CODE.replace_all(text, "");
    let text = COUNTRY_PREFIX.replace(text.trim(), "");
    let text = text.replace("(Polska)", "").replace("()", "");
    let text = EDGE_PUNCTUATION.replace_all(text.trim(), "");
    let mut text = text.trim().to_string();

    if let Some(caps) = DASH_PAIR.captures(&text) {
        let (left, right) = (caps[1].trim(), caps[2].trim());
        if left.to_lowercase() == right.to_lowercase() {
            text = left.to_string();
        }
    }

    (!text.is_empty()).then_some(text)
}

/// Voivodeship of a known big city, case-insensitive
pub fn known_region(city: &str) -> Option<&'static str> {
    let city = city.trim().to_lowercase();
    KNOWN_CITY_REGIONS
        .iter()
        .find(|(name, _)| name.to_lowercase() == city)
        .map(|(_, region)| *region)
}
