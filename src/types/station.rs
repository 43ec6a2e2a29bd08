//! Defines the observation station entity and how it absorbs new sample batches.

use crate::stations::error::LocateError;
use crate::stations::locate::{climate_station_location, station_location};
use crate::types::coordinates::LatLon;
use crate::types::raw::{is_empty_value, value_as_f64, value_as_string, RawRecord};
use crate::utils::{current_hour, parse_api_timestamp};
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use log::debug;
use serde::Serialize;
use serde_json::Value;

const STATION_ID: &str = "idema";
const STATION_NAME: &str = "ubi";
const STATION_ALTITUDE: &str = "alt";
const STATION_DATE: &str = "fint";
const STATION_DEW_POINT: &str = "tpr";
const STATION_HUMIDITY: &str = "hr";
const STATION_PRECIPITATION: &str = "prec";
const STATION_PRESSURE: &str = "pres";
const STATION_PRESSURE_SEA: &str = "pres_nmar";
const STATION_TEMPERATURE: &str = "ta";
const STATION_TEMPERATURE_MAX: &str = "tamax";
const STATION_TEMPERATURE_MIN: &str = "tamin";
const STATION_WIND_DIRECTION: &str = "dv";
const STATION_WIND_SPEED: &str = "vv";
const STATION_WIND_SPEED_MAX: &str = "vmax";

const DISTANCE_DECIMALS: i32 = 3;

/// The measured quantities of the latest adopted sample. Every field is
/// optional; a sample only overwrites the fields it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StationSample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    /// Sea-level pressure when reported, station pressure otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_max: Option<f64>,
}

impl StationSample {
    fn merged_with(&self, record: &RawRecord) -> StationSample {
        let field = |key: &str, current: Option<f64>| -> Option<f64> {
            match record.get(key) {
                Some(value) if !is_empty_value(value) => match value_as_f64(value) {
                    Some(parsed) => Some(parsed),
                    None => {
                        debug!("Ignoring non-numeric station field '{key}': {value}");
                        current
                    }
                },
                _ => current,
            }
        };
        let has_sea_pressure = record
            .get(STATION_PRESSURE_SEA)
            .is_some_and(|value| !is_empty_value(value));
        let pressure = if has_sea_pressure {
            field(STATION_PRESSURE_SEA, self.pressure)
        } else {
            field(STATION_PRESSURE, self.pressure)
        };
        StationSample {
            dew_point: field(STATION_DEW_POINT, self.dew_point),
            humidity: field(STATION_HUMIDITY, self.humidity),
            precipitation: field(STATION_PRECIPITATION, self.precipitation),
            pressure,
            temperature: field(STATION_TEMPERATURE, self.temperature),
            temperature_max: field(STATION_TEMPERATURE_MAX, self.temperature_max),
            temperature_min: field(STATION_TEMPERATURE_MIN, self.temperature_min),
            wind_direction: field(STATION_WIND_DIRECTION, self.wind_direction),
            wind_speed: field(STATION_WIND_SPEED, self.wind_speed),
            wind_speed_max: field(STATION_WIND_SPEED_MAX, self.wind_speed_max),
        }
    }
}

/// A conventional observation station and its most recent sample.
///
/// Stations are immutable values: [`Station::with_samples_at`] returns the
/// updated station instead of changing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location: LatLon,
    pub altitude: f64,
    /// Distance from the selected coordinates.
    pub distance_km: f64,
    pub timezone: Tz,
    /// Time of the adopted sample.
    pub datetime: DateTime<Utc>,
    pub sample: StationSample,
}

/// Serializable view of a [`Station`]. Missing measurements are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StationData {
    pub altitude: f64,
    pub coordinates: (f64, f64),
    pub datetime: String,
    pub distance: f64,
    pub id: String,
    pub name: String,
    pub outdated: bool,
    pub timestamp_utc: String,
    pub timezone: Tz,
    #[serde(flatten)]
    pub sample: StationSample,
}

fn sample_time(record: &RawRecord) -> Option<DateTime<Utc>> {
    let raw = record.get(STATION_DATE).and_then(Value::as_str)?;
    match parse_api_timestamp(raw) {
        Ok(datetime) => Some(datetime),
        Err(err) => {
            debug!("Ignoring station sample: {err}");
            None
        }
    }
}

pub(crate) fn round_distance(distance_km: f64) -> f64 {
    let factor = 10f64.powi(DISTANCE_DECIMALS);
    (distance_km * factor).round() / factor
}

impl Station {
    /// Builds a station from its catalog record, which doubles as its first sample.
    pub fn new(record: &RawRecord, distance_km: f64) -> Result<Self, LocateError> {
        let invalid = |field: &'static str| LocateError::InvalidRecord {
            kind: "Station",
            field,
        };
        let location = station_location(record)?;
        let id = record
            .get(STATION_ID)
            .and_then(value_as_string)
            .ok_or_else(|| invalid(STATION_ID))?;
        let datetime = sample_time(record).ok_or_else(|| invalid(STATION_DATE))?;

        Ok(Station {
            id,
            name: record
                .get(STATION_NAME)
                .and_then(value_as_string)
                .unwrap_or_default(),
            location,
            altitude: record
                .get(STATION_ALTITUDE)
                .and_then(value_as_f64)
                .ok_or_else(|| invalid(STATION_ALTITUDE))?,
            distance_km,
            timezone: location.timezone(),
            datetime,
            sample: StationSample::default().merged_with(record),
        })
    }

    /// Adopts the newest sample of `samples` that is strictly newer than the
    /// current one and not later than the hour `now` falls in. Any other
    /// batch leaves the station as it is.
    ///
    /// `samples` is a list of sample records; a single record is accepted too.
    pub fn with_samples_at(&self, samples: &Value, now: DateTime<Utc>) -> Station {
        let records: Vec<&RawRecord> = match samples {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            Value::Object(record) => vec![record],
            _ => Vec::new(),
        };
        let cutoff = current_hour(now);
        let latest = records
            .into_iter()
            .filter_map(|record| sample_time(record).map(|datetime| (datetime, record)))
            .filter(|(datetime, _)| *datetime > self.datetime && *datetime <= cutoff)
            .max_by_key(|(datetime, _)| *datetime);

        match latest {
            Some((datetime, record)) => Station {
                datetime,
                sample: self.sample.merged_with(record),
                ..self.clone()
            },
            None => {
                debug!("No newer sample for station {}", self.id);
                self.clone()
            }
        }
    }

    pub fn with_samples(&self, samples: &Value) -> Station {
        self.with_samples_at(samples, Utc::now())
    }

    /// Whether the adopted sample is older than `max_age` at the hour `now`
    /// falls in.
    pub fn is_outdated_at(&self, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
        current_hour(now) - self.datetime > max_age
    }

    pub fn data_at(&self, now: DateTime<Utc>, max_age: TimeDelta) -> StationData {
        StationData {
            altitude: self.altitude,
            coordinates: (self.location.0, self.location.1),
            datetime: self.datetime.with_timezone(&self.timezone).to_rfc3339(),
            distance: round_distance(self.distance_km),
            id: self.id.clone(),
            name: self.name.clone(),
            outdated: self.is_outdated_at(now, max_age),
            timestamp_utc: self.datetime.to_rfc3339(),
            timezone: self.timezone,
            sample: self.sample.clone(),
        }
    }

    /// What the station contributes to the merged weather, staleness aside.
    pub fn weather(&self) -> crate::weather::WeatherSource {
        crate::weather::WeatherSource {
            dew_point: self.sample.dew_point,
            humidity: self.sample.humidity,
            precipitation: self.sample.precipitation,
            pressure: self.sample.pressure,
            temperature: self.sample.temperature,
            wind_direction: self.sample.wind_direction,
            wind_speed: self.sample.wind_speed,
            wind_speed_max: self.sample.wind_speed_max,
            ..Default::default()
        }
    }
}

const CLIMATE_STATION_ID: &str = "indicativo";
const CLIMATE_STATION_NAME: &str = "nombre";
const CLIMATE_STATION_PROVINCE: &str = "provincia";
const CLIMATE_STATION_ALTITUDE: &str = "altitud";

/// A station of the climatological-values inventory. These carry no samples;
/// they identify where long-term records for the area come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClimateStation {
    pub id: String,
    pub name: String,
    pub province: Option<String>,
    #[serde(skip)]
    pub location: LatLon,
    pub altitude: Option<f64>,
    #[serde(skip)]
    pub distance_km: f64,
}

impl ClimateStation {
    pub fn new(record: &RawRecord, distance_km: f64) -> Result<Self, LocateError> {
        Ok(ClimateStation {
            id: record
                .get(CLIMATE_STATION_ID)
                .and_then(value_as_string)
                .ok_or(LocateError::InvalidRecord {
                    kind: "Climate station",
                    field: CLIMATE_STATION_ID,
                })?,
            name: record
                .get(CLIMATE_STATION_NAME)
                .and_then(value_as_string)
                .unwrap_or_default(),
            province: record.get(CLIMATE_STATION_PROVINCE).and_then(value_as_string),
            location: climate_station_location(record)?,
            altitude: record.get(CLIMATE_STATION_ALTITUDE).and_then(value_as_f64),
            distance_km,
        })
    }
}
