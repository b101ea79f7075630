//! Locale-aware value normalization
//!
//! Listing pages format numbers the Polish way (`93 800`, `1,5`) and answer
//! yes/no questions in Polish (`Tak`/`Nie`).

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// First number-shaped run: a digit followed by digits, whitespace, dots or commas
static NUMBER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s.,]*").expect("hardcoded regex pattern is valid"));

/// Words that normalize to [`Flag::Yes`] (compared lowercase)
const AFFIRMATIVE_WORDS: [&str; 4] = ["tak", "yes", "true", "1"];

/// Converts strings like `"150 000 km"`, `"93 800"` or `"1,5"` to numbers
///
/// Keeps digits, commas and dots of the first number-shaped run, turns
/// commas into decimal points and parses the rest. Anything that does not
/// parse yields `None`.
///
/// # Examples
///
/// ```
/// use otomoto_harvester::extract::clean_numeric;
///
/// assert_eq!(clean_numeric("93 800"), Some(93800.0));
/// assert_eq!(clean_numeric("1,5"), Some(1.5));
/// assert_eq!(clean_numeric("1 598 cm3"), Some(1598.0));
/// assert_eq!(clean_numeric("—"), None);
/// ```
pub fn clean_numeric(raw: &str) -> Option<f64> {
    let run = NUMBER_RUN.find(raw)?.as_str();

    let cleaned: String = run
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok()
}

/// Normalized yes/no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Yes,
    No,
}

impl Flag {
    /// Total mapping from a raw answer to a flag
    ///
    /// Case-insensitive membership in `tak`/`yes`/`true`/`1` gives `Yes`;
    /// everything else, including a missing or empty value, gives `No`.
    pub fn from_raw(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::No;
        };

        let normalized = value.trim().to_lowercase();
        if AFFIRMATIVE_WORDS.contains(&normalized.as_str()) {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String form of [`Flag::from_raw`]: always `"Yes"` or `"No"`
pub fn normalize_yes_no(value: Option<&str>) -> &'static str {
    Flag::from_raw(value).as_str()
}
