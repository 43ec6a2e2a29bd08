//! Unit normalization for wind directions and precipitation amounts.

use crate::forecast::error::ForecastError;
use crate::types::raw::{display_value, value_as_f64};
use serde_json::Value;

/// Token the provider uses for a trace ("inapreciable") amount of precipitation.
pub const PRECIPITATION_TRACE: &str = "Ip";

/// Converts a compass point name into degrees.
///
/// Calm (`C`) and unknown names carry no direction. Names use the Spanish
/// initials, so west is `O` (oeste).
pub fn parse_wind_direction(direction: &str) -> Option<f64> {
    match direction {
        "N" => Some(0.0),
        "NE" => Some(45.0),
        "E" => Some(90.0),
        "SE" => Some(135.0),
        "S" => Some(180.0),
        "SO" => Some(225.0),
        "O" => Some(270.0),
        "NO" => Some(315.0),
        _ => None,
    }
}

/// Converts a precipitation cell into millimetres. A trace amount is `0.0`.
pub fn parse_precipitation(key: &str, value: &Value) -> Result<f64, ForecastError> {
    if value.as_str() == Some(PRECIPITATION_TRACE) {
        return Ok(0.0);
    }
    value_as_f64(value).ok_or_else(|| ForecastError::InvalidNumber {
        key: key.to_string(),
        value: display_value(value),
    })
}
