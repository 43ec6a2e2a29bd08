//! Defines the `WeatherCondition` vocabulary and the mapping from AEMET sky-state
//! codes (`estadoCielo`) onto it.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Coarse sky condition resolved from an AEMET sky-state code.
///
/// Codes ending in `n` are the night-time variants of the same state; both map
/// onto the same condition except for a clear sky, which becomes
/// [`WeatherCondition::ClearNight`] at night.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WeatherCondition {
    /// Clear sky at night (`11n`).
    ClearNight,
    /// Cloudy, very cloudy, overcast or high clouds (`14`–`17`).
    Cloudy,
    /// Fog or mist (`81`, `82`).
    Fog,
    /// Storm without rain (`51`–`54`).
    Lightning,
    /// Storm with light rain (`61`–`64`).
    LightningRainy,
    /// Few clouds or cloudy intervals (`12`, `13`).
    PartlyCloudy,
    /// Showers (`27`).
    Pouring,
    /// Rain or light rain (`23`–`26`, `43`–`46`).
    Rainy,
    /// Snow or light snow (`33`–`36`, `71`–`74`).
    Snowy,
    /// Clear sky by day (`11`).
    Sunny,
}

const CONDITION_GROUPS: &[(WeatherCondition, &[&str])] = &[
    (WeatherCondition::ClearNight, &["11n"]),
    (
        WeatherCondition::Cloudy,
        &["14", "14n", "15", "15n", "16", "16n", "17", "17n"],
    ),
    (WeatherCondition::Fog, &["81", "81n", "82", "82n"]),
    (
        WeatherCondition::Lightning,
        &["51", "51n", "52", "52n", "53", "53n", "54", "54n"],
    ),
    (
        WeatherCondition::LightningRainy,
        &["61", "61n", "62", "62n", "63", "63n", "64", "64n"],
    ),
    (WeatherCondition::PartlyCloudy, &["12", "12n", "13", "13n"]),
    (WeatherCondition::Pouring, &["27", "27n"]),
    (
        WeatherCondition::Rainy,
        &[
            "23", "23n", "24", "24n", "25", "25n", "26", "26n", "43", "43n", "44", "44n", "45",
            "45n", "46", "46n",
        ],
    ),
    (
        WeatherCondition::Snowy,
        &[
            "33", "33n", "34", "34n", "35", "35n", "36", "36n", "71", "71n", "72", "72n", "73",
            "73n", "74", "74n",
        ],
    ),
    (WeatherCondition::Sunny, &["11"]),
];

// Flat code -> condition index, built once from the grouped table.
static CONDITION_INDEX: LazyLock<HashMap<&'static str, WeatherCondition>> = LazyLock::new(|| {
    CONDITION_GROUPS
        .iter()
        .flat_map(|(condition, codes)| codes.iter().map(move |code| (*code, *condition)))
        .collect()
});

impl WeatherCondition {
    /// Looks up a provider sky-state code.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use aemet_weather::WeatherCondition;
    ///
    /// assert_eq!(WeatherCondition::from_code("62n"), Some(WeatherCondition::LightningRainy));
    /// assert_eq!(WeatherCondition::from_code("99x"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        CONDITION_INDEX.get(code).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::ClearNight => "clear-night",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Lightning => "lightning",
            WeatherCondition::LightningRainy => "lightning-rainy",
            WeatherCondition::PartlyCloudy => "partly-cloudy",
            WeatherCondition::Pouring => "pouring",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Snowy => "snowy",
            WeatherCondition::Sunny => "sunny",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved sky condition. Codes missing from the table are kept verbatim so
/// that states introduced upstream still reach the caller.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Condition {
    Known(WeatherCondition),
    Unknown(String),
}

impl Condition {
    /// Resolves a raw sky-state code.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use aemet_weather::Condition;
    ///
    /// assert_eq!(Condition::parse("11n").as_str(), "clear-night");
    /// assert_eq!(Condition::parse("99x").as_str(), "99x");
    /// ```
    pub fn parse(code: &str) -> Self {
        match WeatherCondition::from_code(code) {
            Some(condition) => Condition::Known(condition),
            None => Condition::Unknown(code.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Condition::Known(condition) => condition.as_str(),
            Condition::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
