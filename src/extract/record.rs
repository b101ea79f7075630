//! Fixed record schema for one listing

use super::numeric::{clean_numeric, Flag};

/// Placeholder title used when a page has no heading
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Currency assumed when a price was found without a currency token
pub const DEFAULT_CURRENCY: &str = "PLN";

/// Separator between image URLs in the serialized record
pub const IMAGE_URL_SEPARATOR: &str = "|";

/// How the raw text of a technical attribute is post-processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Locale-aware number cleaning
    Numeric,

    /// Yes/No normalization
    Flag,

    /// Trimmed text, empty becomes null
    Text,
}

/// One entry of the technical attribute catalog
///
/// Each attribute lives in a `div` whose `data-testid` equals its
/// [`marker`](Self::marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Year,
    MileageKm,
    EngineCapacityCm3,
    FuelType,
    PowerHp,
    Gearbox,
    Drive,
    BodyType,
    Doors,
    Seats,
    Color,
    Origin,
    Brand,
    Model,
    Generation,
    Version,
    AccidentFree,
    Damaged,
    FirstOwner,
    RegisteredPl,
    HasRegistration,
    Condition,
}

impl Attribute {
    /// The whole catalog, in column order
    pub const ALL: [Attribute; 22] = [
        Attribute::Year,
        Attribute::MileageKm,
        Attribute::EngineCapacityCm3,
        Attribute::FuelType,
        Attribute::PowerHp,
        Attribute::Gearbox,
        Attribute::Drive,
        Attribute::BodyType,
        Attribute::Doors,
        Attribute::Seats,
        Attribute::Color,
        Attribute::Origin,
        Attribute::Brand,
        Attribute::Model,
        Attribute::Generation,
        Attribute::Version,
        Attribute::AccidentFree,
        Attribute::Damaged,
        Attribute::FirstOwner,
        Attribute::RegisteredPl,
        Attribute::HasRegistration,
        Attribute::Condition,
    ];

    /// Output column name
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Year => "year",
            Attribute::MileageKm => "mileage_km",
            Attribute::EngineCapacityCm3 => "engine_capacity_cm3",
            Attribute::FuelType => "fuel_type",
            Attribute::PowerHp => "power_hp",
            Attribute::Gearbox => "gearbox",
            Attribute::Drive => "drive",
            Attribute::BodyType => "body_type",
            Attribute::Doors => "doors",
            Attribute::Seats => "seats",
            Attribute::Color => "color",
            Attribute::Origin => "origin",
            Attribute::Brand => "brand",
            Attribute::Model => "model",
            Attribute::Generation => "generation",
            Attribute::Version => "version",
            Attribute::AccidentFree => "accident_free",
            Attribute::Damaged => "damaged",
            Attribute::FirstOwner => "first_owner",
            Attribute::RegisteredPl => "registered_pl",
            Attribute::HasRegistration => "has_registration",
            Attribute::Condition => "condition",
        }
    }

    /// `data-testid` of the container holding the value
    pub fn marker(self) -> &'static str {
        match self {
            Attribute::Year => "year",
            Attribute::MileageKm => "mileage",
            Attribute::EngineCapacityCm3 => "engine_capacity",
            Attribute::FuelType => "fuel_type",
            Attribute::PowerHp => "engine_power",
            Attribute::Gearbox => "gearbox",
            Attribute::Drive => "transmission",
            Attribute::BodyType => "body_type",
            Attribute::Doors => "door_count",
            Attribute::Seats => "nr_seats",
            Attribute::Color => "color",
            Attribute::Origin => "country_origin",
            Attribute::Brand => "make",
            Attribute::Model => "model",
            Attribute::Generation => "generation",
            Attribute::Version => "version",
            Attribute::AccidentFree => "no_accident",
            Attribute::Damaged => "damaged",
            Attribute::FirstOwner => "original_owner",
            Attribute::RegisteredPl => "registered",
            Attribute::HasRegistration => "has_registration",
            Attribute::Condition => "new_used",
        }
    }

    pub fn kind(self) -> AttributeKind {
        match self {
            Attribute::Year
            | Attribute::MileageKm
            | Attribute::EngineCapacityCm3
            | Attribute::PowerHp
            | Attribute::Doors
            | Attribute::Seats => AttributeKind::Numeric,
            Attribute::AccidentFree
            | Attribute::Damaged
            | Attribute::FirstOwner
            | Attribute::RegisteredPl
            | Attribute::HasRegistration => AttributeKind::Flag,
            _ => AttributeKind::Text,
        }
    }
}

/// Post-processed value of one technical attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Numeric(f64),
    Flag(Flag),
    Text(String),
}

impl AttributeValue {
    /// Normalizes raw container text according to `kind`
    ///
    /// Returns `None` when the text does not survive normalization. Flags
    /// never fail: anything unrecognized is `No`.
    pub fn from_raw(kind: AttributeKind, raw: &str) -> Option<Self> {
        match kind {
            AttributeKind::Numeric => clean_numeric(raw).map(Self::Numeric),
            AttributeKind::Flag => Some(Self::Flag(Flag::from_raw(Some(raw)))),
            AttributeKind::Text => {
                let text = raw.trim();
                (!text.is_empty()).then(|| Self::Text(text.to_string()))
            }
        }
    }

    /// Cell text for the CSV output
    pub fn to_cell(&self) -> String {
        match self {
            Self::Numeric(n) => n.to_string(),
            Self::Flag(flag) => flag.as_str().to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// The technical attributes of one listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicalAttributes {
    pub year: Option<f64>,
    pub mileage_km: Option<f64>,
    pub engine_capacity_cm3: Option<f64>,
    pub fuel_type: Option<String>,
    pub power_hp: Option<f64>,
    pub gearbox: Option<String>,
    pub drive: Option<String>,
    pub body_type: Option<String>,
    pub doors: Option<f64>,
    pub seats: Option<f64>,
    pub color: Option<String>,
    pub origin: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub generation: Option<String>,
    pub version: Option<String>,
    pub accident_free: Option<Flag>,
    pub damaged: Option<Flag>,
    pub first_owner: Option<Flag>,
    pub registered_pl: Option<Flag>,
    pub has_registration: Option<Flag>,
    pub condition: Option<String>,
}

impl TechnicalAttributes {
    /// Current value of `attribute`
    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        use AttributeValue::{Flag as F, Numeric as N, Text as T};

        match attribute {
            Attribute::Year => self.year.map(N),
            Attribute::MileageKm => self.mileage_km.map(N),
            Attribute::EngineCapacityCm3 => self.engine_capacity_cm3.map(N),
            Attribute::FuelType => self.fuel_type.clone().map(T),
            Attribute::PowerHp => self.power_hp.map(N),
            Attribute::Gearbox => self.gearbox.clone().map(T),
            Attribute::Drive => self.drive.clone().map(T),
            Attribute::BodyType => self.body_type.clone().map(T),
            Attribute::Doors => self.doors.map(N),
            Attribute::Seats => self.seats.map(N),
            Attribute::Color => self.color.clone().map(T),
            Attribute::Origin => self.origin.clone().map(T),
            Attribute::Brand => self.brand.clone().map(T),
            Attribute::Model => self.model.clone().map(T),
            Attribute::Generation => self.generation.clone().map(T),
            Attribute::Version => self.version.clone().map(T),
            Attribute::AccidentFree => self.accident_free.map(F),
            Attribute::Damaged => self.damaged.map(F),
            Attribute::FirstOwner => self.first_owner.map(F),
            Attribute::RegisteredPl => self.registered_pl.map(F),
            Attribute::HasRegistration => self.has_registration.map(F),
            Attribute::Condition => self.condition.clone().map(T),
        }
    }

    /// Stores `value` unless the attribute already holds one
    ///
    /// A value of the wrong kind for `attribute` is ignored. Returns whether
    /// the value was stored.
    pub fn fill(&mut self, attribute: Attribute, value: AttributeValue) -> bool {
        match (attribute, value) {
            (Attribute::Year, AttributeValue::Numeric(n)) => fill_slot(&mut self.year, n),
            (Attribute::MileageKm, AttributeValue::Numeric(n)) => {
                fill_slot(&mut self.mileage_km, n)
            }
            (Attribute::EngineCapacityCm3, AttributeValue::Numeric(n)) => {
                fill_slot(&mut self.engine_capacity_cm3, n)
            }
            (Attribute::PowerHp, AttributeValue::Numeric(n)) => fill_slot(&mut self.power_hp, n),
            (Attribute::Doors, AttributeValue::Numeric(n)) => fill_slot(&mut self.doors, n),
            (Attribute::Seats, AttributeValue::Numeric(n)) => fill_slot(&mut self.seats, n),

            (Attribute::FuelType, AttributeValue::Text(t)) => fill_slot(&mut self.fuel_type, t),
            (Attribute::Gearbox, AttributeValue::Text(t)) => fill_slot(&mut self.gearbox, t),
            (Attribute::Drive, AttributeValue::Text(t)) => fill_slot(&mut self.drive, t),
            (Attribute::BodyType, AttributeValue::Text(t)) => fill_slot(&mut self.body_type, t),
            (Attribute::Color, AttributeValue::Text(t)) => fill_slot(&mut self.color, t),
            (Attribute::Origin, AttributeValue::Text(t)) => fill_slot(&mut self.origin, t),
            (Attribute::Brand, AttributeValue::Text(t)) => fill_slot(&mut self.brand, t),
            (Attribute::Model, AttributeValue::Text(t)) => fill_slot(&mut self.model, t),
            (Attribute::Generation, AttributeValue::Text(t)) => {
                fill_slot(&mut self.generation, t)
            }
            (Attribute::Version, AttributeValue::Text(t)) => fill_slot(&mut self.version, t),
            (Attribute::Condition, AttributeValue::Text(t)) => fill_slot(&mut self.condition, t),

            (Attribute::AccidentFree, AttributeValue::Flag(f)) => {
                fill_slot(&mut self.accident_free, f)
            }
            (Attribute::Damaged, AttributeValue::Flag(f)) => fill_slot(&mut self.damaged, f),
            (Attribute::FirstOwner, AttributeValue::Flag(f)) => {
                fill_slot(&mut self.first_owner, f)
            }
            (Attribute::RegisteredPl, AttributeValue::Flag(f)) => {
                fill_slot(&mut self.registered_pl, f)
            }
            (Attribute::HasRegistration, AttributeValue::Flag(f)) => {
                fill_slot(&mut self.has_registration, f)
            }

            (attribute, value) => {
                tracing::trace!(?attribute, ?value, "Ignoring value of the wrong kind");
                false
            }
        }
    }

    /// Number of attributes holding a value
    pub fn present_count(&self) -> usize {
        Attribute::ALL
            .iter()
            .filter(|a| self.get(**a).is_some())
            .count()
    }
}

/// Writes `value` into an empty slot, never overwriting
pub(crate) fn fill_slot<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

/// Normalized data extracted from one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub link: String,
    pub title: String,
    pub description: String,

    /// Absolute gallery URLs, first-seen order, no duplicates
    pub image_urls: Vec<String>,

    pub price: Option<f64>,
    pub currency: Option<String>,
    pub location_city: Option<String>,
    pub location_district: Option<String>,
    pub location_voivodeship: Option<String>,
    pub technical: TechnicalAttributes,
}

impl ListingRecord {
    /// Column order of the serialized record
    pub const COLUMNS: [&'static str; 31] = [
        "link",
        "title",
        "description",
        "image_urls",
        "price",
        "currency",
        "location_city",
        "location_district",
        "location_voivodeship",
        "year",
        "mileage_km",
        "engine_capacity_cm3",
        "fuel_type",
        "power_hp",
        "gearbox",
        "drive",
        "body_type",
        "doors",
        "seats",
        "color",
        "origin",
        "brand",
        "model",
        "generation",
        "version",
        "accident_free",
        "damaged",
        "first_owner",
        "registered_pl",
        "has_registration",
        "condition",
    ];

    /// Empty record for `link` with the placeholder title
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: UNKNOWN_TITLE.to_string(),
            description: String::new(),
            image_urls: Vec::new(),
            price: None,
            currency: None,
            location_city: None,
            location_district: None,
            location_voivodeship: None,
            technical: TechnicalAttributes::default(),
        }
    }

    /// Image URLs as one `|`-joined string
    pub fn joined_image_urls(&self) -> String {
        self.image_urls.join(IMAGE_URL_SEPARATOR)
    }

    /// Record as CSV cells, in [`COLUMNS`](Self::COLUMNS) order
    ///
    /// Null values become empty cells.
    pub fn to_csv_row(&self) -> Vec<String> {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();

        let mut row = Vec::with_capacity(Self::COLUMNS.len());
        row.push(self.link.clone());
        row.push(self.title.clone());
        row.push(self.description.clone());
        row.push(self.joined_image_urls());
        row.push(self.price.map(|p| p.to_string()).unwrap_or_default());
        row.push(opt(&self.currency));
        row.push(opt(&self.location_city));
        row.push(opt(&self.location_district));
        row.push(opt(&self.location_voivodeship));

        for attribute in Attribute::ALL {
            row.push(
                self.technical
                    .get(attribute)
                    .map(|value| value.to_cell())
                    .unwrap_or_default(),
            );
        }

        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_columns_follow_catalog() {
        let technical: Vec<&str> = ListingRecord::COLUMNS[9..].to_vec();
        let catalog: Vec<&str> = Attribute::ALL.iter().map(|a| a.column()).collect();
        assert_eq!(technical, catalog);
    }

    #[test]
    fn test_catalog_markers_unique() {
        let markers: HashSet<_> = Attribute::ALL.iter().map(|a| a.marker()).collect();
        assert_eq!(markers.len(), Attribute::ALL.len());
    }

    #[test]
    fn test_catalog_kinds() {
        let count = |kind| Attribute::ALL.iter().filter(|a| a.kind() == kind).count();
        assert_eq!(count(AttributeKind::Numeric), 6);
        assert_eq!(count(AttributeKind::Flag), 5);
        assert_eq!(count(AttributeKind::Text), 11);
    }

    #[test]
    fn test_value_from_raw() {
        assert_eq!(
            AttributeValue::from_raw(AttributeKind::Numeric, "150 000 km"),
            Some(AttributeValue::Numeric(150000.0))
        );
        assert_eq!(AttributeValue::from_raw(AttributeKind::Numeric, "brak"), None);
        assert_eq!(
            AttributeValue::from_raw(AttributeKind::Flag, "Tak"),
            Some(AttributeValue::Flag(Flag::Yes))
        );
        assert_eq!(
            AttributeValue::from_raw(AttributeKind::Flag, ""),
            Some(AttributeValue::Flag(Flag::No))
        );
        assert_eq!(
            AttributeValue::from_raw(AttributeKind::Text, "  Benzyna "),
            Some(AttributeValue::Text("Benzyna".to_string()))
        );
        assert_eq!(AttributeValue::from_raw(AttributeKind::Text, "   "), None);
    }

    #[test]
    fn test_fill_never_overwrites() {
        let mut technical = TechnicalAttributes::default();
        assert!(technical.fill(Attribute::Year, AttributeValue::Numeric(2019.0)));
        assert!(!technical.fill(Attribute::Year, AttributeValue::Numeric(2001.0)));
        assert_eq!(technical.year, Some(2019.0));
    }

    #[test]
    fn test_fill_rejects_wrong_kind() {
        let mut technical = TechnicalAttributes::default();
        assert!(!technical.fill(Attribute::Year, AttributeValue::Text("2019".to_string())));
        assert_eq!(technical.year, None);
    }

    #[test]
    fn test_get_after_fill() {
        let mut technical = TechnicalAttributes::default();
        for attribute in Attribute::ALL {
            let value = match attribute.kind() {
                AttributeKind::Numeric => AttributeValue::Numeric(1.0),
                AttributeKind::Flag => AttributeValue::Flag(Flag::Yes),
                AttributeKind::Text => AttributeValue::Text("x".to_string()),
            };
            assert!(technical.fill(attribute, value.clone()), "{:?}", attribute);
            assert_eq!(technical.get(attribute), Some(value));
        }
        assert_eq!(technical.present_count(), 22);
    }

    #[test]
    fn test_new_record_defaults() {
        let record = ListingRecord::new("https://www.otomoto.pl/osobowe/oferta/x.html");
        assert_eq!(record.title, UNKNOWN_TITLE);
        assert!(record.description.is_empty());
        assert!(record.price.is_none());
        assert_eq!(record.technical.present_count(), 0);
    }

    #[test]
    fn test_csv_row() {
        let mut record = ListingRecord::new("https://www.otomoto.pl/osobowe/oferta/x.html");
        record.image_urls = vec!["https://a/1.jpg".to_string(), "https://a/2.jpg".to_string()];
        record.price = Some(93800.0);
        record.currency = Some(DEFAULT_CURRENCY.to_string());
        record.technical.accident_free = Some(Flag::Yes);
        record.technical.fuel_type = Some("Diesel".to_string());

        let row = record.to_csv_row();
        assert_eq!(row.len(), ListingRecord::COLUMNS.len());
        assert_eq!(row[3], "https://a/1.jpg|https://a/2.jpg");
        assert_eq!(row[4], "93800");
        assert_eq!(row[5], "PLN");
        assert_eq!(row[6], "");
        assert_eq!(row[12], "Diesel");
        assert_eq!(row[25], "Yes");
        assert_eq!(row[26], "");
    }
}
