pub mod daily_forecast;
pub mod daily_value;
pub mod error;
pub mod hourly_forecast;
pub mod hourly_value;

use crate::forecast::error::ForecastError;
use crate::types::raw::{display_value, value_as_f64, value_as_i64, RawRecord};
use crate::utils::{parse_api_timestamp, parse_forecast_date};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

pub(crate) const ATTR_DATE: &str = "fecha";
pub(crate) const ATTR_DAY: &str = "dia";
pub(crate) const ATTR_DIRECTION: &str = "direccion";
pub(crate) const ATTR_ELABORATED: &str = "elaborado";
pub(crate) const ATTR_FEEL_TEMPERATURE: &str = "sensTermica";
pub(crate) const ATTR_FORECAST: &str = "prediccion";
pub(crate) const ATTR_HUMIDITY: &str = "humedadRelativa";
pub(crate) const ATTR_MAX: &str = "maxima";
pub(crate) const ATTR_MIN: &str = "minima";
pub(crate) const ATTR_PRECIPITATION: &str = "precipitacion";
pub(crate) const ATTR_PRECIPITATION_PROBABILITY: &str = "probPrecipitacion";
pub(crate) const ATTR_SKY_STATE: &str = "estadoCielo";
pub(crate) const ATTR_SNOW: &str = "nieve";
pub(crate) const ATTR_SNOW_PROBABILITY: &str = "probNieve";
pub(crate) const ATTR_SPEED: &str = "velocidad";
pub(crate) const ATTR_STORM_PROBABILITY: &str = "probTormenta";
pub(crate) const ATTR_SUNRISE: &str = "orto";
pub(crate) const ATTR_SUNSET: &str = "ocaso";
pub(crate) const ATTR_TEMPERATURE: &str = "temperatura";
pub(crate) const ATTR_UV_MAX: &str = "uvMax";
pub(crate) const ATTR_WIND: &str = "viento";
pub(crate) const ATTR_WIND_GUST: &str = "vientoAndRachaMax";

pub(crate) fn parse_int(key: &str, value: &Value) -> Result<i64, ForecastError> {
    value_as_i64(value).ok_or_else(|| ForecastError::InvalidNumber {
        key: key.to_string(),
        value: display_value(value),
    })
}

pub(crate) fn parse_float(key: &str, value: &Value) -> Result<f64, ForecastError> {
    value_as_f64(value).ok_or_else(|| ForecastError::InvalidNumber {
        key: key.to_string(),
        value: display_value(value),
    })
}

/// Unwraps a forecast table. The provider answers with a one-element array
/// around the table object; the bare object is accepted too.
pub(crate) fn table_record(table: &Value) -> Option<&RawRecord> {
    match table {
        Value::Object(record) => Some(record),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}

/// The `elaborado` timestamp of a table.
pub(crate) fn table_timestamp(record: &RawRecord) -> Result<DateTime<Utc>, ForecastError> {
    let elaborated = record
        .get(ATTR_ELABORATED)
        .and_then(Value::as_str)
        .ok_or_else(|| ForecastError::MissingAttribute(ATTR_ELABORATED.to_string()))?;
    parse_api_timestamp(elaborated)
}

/// Keeps a built slot, drops it with a debug log when the error only concerns
/// that slot, and propagates anything else.
pub(crate) fn keep_slot<T>(slot: Result<T, ForecastError>) -> Result<Option<T>, ForecastError> {
    match slot {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_recoverable() => {
            debug!("Skipping forecast slot: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// The per-day rows of a forecast table (`prediccion.dia`).
pub(crate) fn table_days(record: &RawRecord) -> Vec<&RawRecord> {
    record
        .get(ATTR_FORECAST)
        .and_then(|forecast| forecast.get(ATTR_DAY))
        .and_then(Value::as_array)
        .map(|days| days.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

/// The calendar date of a forecast day row. Rows without a usable date are
/// skipped with a warning.
pub(crate) fn day_date(day: &RawRecord) -> Option<NaiveDate> {
    let Some(raw) = day.get(ATTR_DATE).and_then(Value::as_str) else {
        warn!("Skipping forecast day without '{ATTR_DATE}'");
        return None;
    };
    match parse_forecast_date(raw) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("Skipping forecast day: {err}");
            None
        }
    }
}

/// A point in time rendered both in the locality's zone and in UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Timestamps {
    pub timestamp_local: String,
    pub timestamp_utc: String,
}

impl Timestamps {
    pub fn new(datetime: &DateTime<Tz>) -> Self {
        Timestamps {
            timestamp_local: datetime.to_rfc3339(),
            timestamp_utc: datetime.with_timezone(&Utc).to_rfc3339(),
        }
    }
}
