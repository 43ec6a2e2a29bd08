//! The merged weather snapshot and the per-field source priority used to build it.

use crate::types::weather_condition::Condition;
use serde::Serialize;

/// The weather fields one source (station sample, current hour, current day)
/// can contribute. A source with nothing to say is `WeatherSource::default()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSource {
    pub condition: Option<Condition>,
    pub dew_point: Option<f64>,
    pub feel_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<i64>,
    pub pressure: Option<f64>,
    pub rain: Option<f64>,
    pub rain_probability: Option<i64>,
    pub snow: Option<f64>,
    pub snow_probability: Option<i64>,
    pub storm_probability: Option<i64>,
    pub temperature: Option<f64>,
    pub uv_index: Option<i64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

/// Point-in-time weather for the selected coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Weather {
    pub condition: Option<Condition>,
    pub dew_point: Option<f64>,
    pub feel_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<i64>,
    pub pressure: Option<f64>,
    pub rain: Option<f64>,
    pub rain_probability: Option<i64>,
    pub snow: Option<f64>,
    pub snow_probability: Option<i64>,
    pub storm_probability: Option<i64>,
    pub temperature: Option<f64>,
    pub uv_index: Option<i64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

trait Significant {
    fn is_significant(&self) -> bool;
}

impl Significant for f64 {
    fn is_significant(&self) -> bool {
        *self != 0.0
    }
}

impl Significant for Condition {
    fn is_significant(&self) -> bool {
        !self.as_str().is_empty()
    }
}

// First non-zero candidate; a present zero still beats nothing.
fn first_significant<T: Significant + Clone>(candidates: &[&Option<T>]) -> Option<T> {
    let significant = candidates.iter().find_map(|candidate| match candidate {
        Some(value) if value.is_significant() => Some(value),
        _ => None,
    });
    significant
        .or_else(|| candidates.iter().find_map(|candidate| Option::as_ref(candidate)))
        .cloned()
}

impl Weather {
    /// Merges the three sources field by field.
    ///
    /// | field | priority |
    /// |---|---|
    /// | condition | hourly, daily |
    /// | humidity, precipitation, temperature | station, hourly |
    /// | precipitation probability | hourly, daily |
    /// | rain, snow and their probabilities, storm probability, feel temperature | hourly |
    /// | dew point, pressure | station |
    /// | uv index | daily |
    /// | wind direction, wind speed | station, hourly, daily |
    /// | wind speed max | station, hourly |
    ///
    /// Condition and wind fields skip zero readings when a later source has a
    /// non-zero one; the remaining fallbacks only skip missing values. Rain is
    /// taken from the hourly forecast only, never from the station's
    /// precipitation.
    pub fn merge(station: &WeatherSource, hourly: &WeatherSource, daily: &WeatherSource) -> Self {
        Weather {
            condition: first_significant(&[&hourly.condition, &daily.condition]),
            dew_point: station.dew_point,
            feel_temperature: hourly.feel_temperature,
            humidity: station.humidity.or(hourly.humidity),
            precipitation: station.precipitation.or(hourly.precipitation),
            precipitation_probability: hourly
                .precipitation_probability
                .or(daily.precipitation_probability),
            pressure: station.pressure,
            rain: hourly.rain,
            rain_probability: hourly.rain_probability,
            snow: hourly.snow,
            snow_probability: hourly.snow_probability,
            storm_probability: hourly.storm_probability,
            temperature: station.temperature.or(hourly.temperature),
            uv_index: daily.uv_index,
            wind_direction: first_significant(&[
                &station.wind_direction,
                &hourly.wind_direction,
                &daily.wind_direction,
            ]),
            wind_speed: first_significant(&[
                &station.wind_speed,
                &hourly.wind_speed,
                &daily.wind_speed,
            ]),
            wind_speed_max: first_significant(&[&station.wind_speed_max, &hourly.wind_speed_max]),
        }
    }
}
