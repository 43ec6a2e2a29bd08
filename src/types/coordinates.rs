//! Geographic coordinates, sexagesimal decoding and the coordinate based time
//! zone rule used for Spanish territory.

use crate::stations::error::LocateError;
use chrono_tz::Tz;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are decimal degrees.
///
/// # Examples
///
/// ```
/// use aemet_weather::LatLon;
///
/// let madrid = LatLon(40.4168, -3.7038);
/// assert_eq!(madrid.0, 40.4168); // Latitude
/// assert_eq!(madrid.1, -3.7038); // Longitude
/// assert_eq!(madrid.timezone(), chrono_tz::Europe::Madrid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Zone that local forecast dates and hours are expressed in.
    pub fn timezone(&self) -> Tz {
        timezone_from_coords(*self)
    }
}

// South-west of this corner lies the Canary archipelago.
const CANARY_MAX_LATITUDE: f64 = 32.0;
const CANARY_MAX_LONGITUDE: f64 = -11.5;

/// Canary Islands coordinates get `Atlantic/Canary`, everything else `Europe/Madrid`.
pub fn timezone_from_coords(coords: LatLon) -> Tz {
    if coords.0 < CANARY_MAX_LATITUDE && coords.1 < CANARY_MAX_LONGITUDE {
        Tz::Atlantic__Canary
    } else {
        Tz::Europe__Madrid
    }
}

/// Decodes a compact sexagesimal coordinate such as `394924N` (39° 49' 24" N)
/// or `025309W` into signed decimal degrees. South and west are negative.
///
/// The last two digit pairs are seconds and minutes; whatever digits precede
/// them are the degrees.
pub fn parse_dms(coordinate: &str) -> Result<f64, LocateError> {
    let invalid = || LocateError::InvalidCoordinate(coordinate.to_string());
    let coordinate_trimmed = coordinate.trim();
    let Some(direction) = coordinate_trimmed.chars().last() else {
        return Err(invalid());
    };
    let digits = &coordinate_trimmed[..coordinate_trimmed.len() - direction.len_utf8()];
    if digits.len() < 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let split = digits.len() - 4;
    let degrees: f64 = digits[..split].parse().map_err(|_| invalid())?;
    let minutes: f64 = digits[split..split + 2].parse().map_err(|_| invalid())?;
    let seconds: f64 = digits[split + 2..].parse().map_err(|_| invalid())?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return Err(invalid());
    }

    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match direction.to_ascii_uppercase() {
        'N' | 'E' => Ok(value),
        'S' | 'W' | 'O' => Ok(-value),
        _ => Err(invalid()),
    }
}

const TOWN_ID_PREFIX: &str = "id";

/// Strips the `id` prefix locality ids carry in some listings (`id28079` → `28079`).
pub fn parse_town_code(town_id: &str) -> &str {
    town_id.strip_prefix(TOWN_ID_PREFIX).unwrap_or(town_id)
}
