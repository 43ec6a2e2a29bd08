//! Defines the locality entity and the forecast series it owns.

use crate::forecast::daily_forecast::{DailyForecast, DailyForecastSeriesData};
use crate::forecast::error::ForecastError;
use crate::forecast::hourly_forecast::{HourlyForecast, HourlyForecastSeriesData};
use crate::stations::error::LocateError;
use crate::stations::locate::town_location;
use crate::types::coordinates::{parse_town_code, LatLon};
use crate::types::raw::{value_as_f64, value_as_i64, value_as_string, RawRecord};
use crate::types::station::round_distance;
use crate::weather::WeatherSource;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

const TOWN_ID: &str = "id";
const TOWN_NAME: &str = "nombre";
const TOWN_ALTITUDE: &str = "altitud";
const TOWN_RESIDENTS: &str = "num_hab";

/// A locality (municipality) and its latest daily and hourly forecasts.
///
/// Supplying a new forecast table rebuilds the matching series from scratch
/// and yields a new `Town`; the previous value is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Town {
    /// Municipality code, without the provider's `id` prefix.
    pub id: String,
    pub name: String,
    pub location: LatLon,
    pub altitude: f64,
    pub residents: i64,
    /// Distance from the selected coordinates.
    pub distance_km: f64,
    pub timezone: Tz,
    daily: Option<DailyForecast>,
    hourly: Option<HourlyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TownData {
    pub altitude: f64,
    pub coordinates: (f64, f64),
    pub distance: f64,
    pub id: String,
    pub name: String,
    pub residents: i64,
    pub timezone: Tz,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_daily: Option<DailyForecastSeriesData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_hourly: Option<HourlyForecastSeriesData>,
}

impl Town {
    pub fn new(record: &RawRecord, distance_km: f64) -> Result<Self, LocateError> {
        let invalid = |field: &'static str| LocateError::InvalidRecord {
            kind: "Town",
            field,
        };
        let location = town_location(record)?;
        let id = record
            .get(TOWN_ID)
            .and_then(value_as_string)
            .ok_or_else(|| invalid(TOWN_ID))?;

        Ok(Town {
            id: parse_town_code(&id).to_string(),
            name: record
                .get(TOWN_NAME)
                .and_then(value_as_string)
                .ok_or_else(|| invalid(TOWN_NAME))?,
            location,
            altitude: record
                .get(TOWN_ALTITUDE)
                .and_then(value_as_f64)
                .ok_or_else(|| invalid(TOWN_ALTITUDE))?,
            residents: record
                .get(TOWN_RESIDENTS)
                .and_then(value_as_i64)
                .ok_or_else(|| invalid(TOWN_RESIDENTS))?,
            distance_km,
            timezone: location.timezone(),
            daily: None,
            hourly: None,
        })
    }

    pub fn daily(&self) -> Option<&DailyForecast> {
        self.daily.as_ref()
    }

    pub fn hourly(&self) -> Option<&HourlyForecast> {
        self.hourly.as_ref()
    }

    /// Replaces the daily series with one built from `table`.
    pub fn with_daily_at(&self, table: &Value, now: DateTime<Utc>) -> Result<Town, ForecastError> {
        let daily = DailyForecast::new_at(table, self.timezone, now)?;
        Ok(Town {
            daily: Some(daily),
            ..self.clone()
        })
    }

    pub fn with_daily(&self, table: &Value) -> Result<Town, ForecastError> {
        self.with_daily_at(table, Utc::now())
    }

    /// Replaces the hourly series with one built from `table`.
    pub fn with_hourly_at(&self, table: &Value, now: DateTime<Utc>) -> Result<Town, ForecastError> {
        let hourly = HourlyForecast::new_at(table, self.timezone, now)?;
        Ok(Town {
            hourly: Some(hourly),
            ..self.clone()
        })
    }

    pub fn with_hourly(&self, table: &Value) -> Result<Town, ForecastError> {
        self.with_hourly_at(table, Utc::now())
    }

    pub fn data_at(&self, now: DateTime<Utc>) -> TownData {
        TownData {
            altitude: self.altitude,
            coordinates: (self.location.0, self.location.1),
            distance: round_distance(self.distance_km),
            id: self.id.clone(),
            name: self.name.clone(),
            residents: self.residents,
            timezone: self.timezone,
            forecast_daily: self.daily.as_ref().map(|daily| daily.data_at(now)),
            forecast_hourly: self.hourly.as_ref().map(|hourly| hourly.data_at(now)),
        }
    }

    pub fn data(&self) -> TownData {
        self.data_at(Utc::now())
    }

    pub fn weather_daily_at(&self, now: DateTime<Utc>) -> WeatherSource {
        self.daily
            .as_ref()
            .map(|daily| daily.weather_at(now))
            .unwrap_or_default()
    }

    pub fn weather_hourly_at(&self, now: DateTime<Utc>) -> WeatherSource {
        self.hourly
            .as_ref()
            .map(|hourly| hourly.weather_at(now))
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::forecast::hourly_forecast::tests::hourly_table;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn town_record() -> Value {
        json!({
            "id": "id28079",
            "nombre": "Madrid",
            "url": "madrid-id28079",
            "latitud_dec": "40.4165",
            "longitud_dec": "-3.70256",
            "altitud": "657",
            "num_hab": "3223334",
            "capital": "Madrid"
        })
    }

    fn town() -> Town {
        Town::new(town_record().as_object().unwrap(), 0.41234).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 45, 0).unwrap()
    }

    #[test]
    fn builds_from_catalog_record() {
        let town = town();
        assert_eq!(town.id, "28079");
        assert_eq!(town.name, "Madrid");
        assert_eq!(town.altitude, 657.0);
        assert_eq!(town.residents, 3_223_334);
        assert_eq!(town.timezone, Tz::Europe__Madrid);
        assert!(town.daily().is_none());
        assert!(town.hourly().is_none());
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut record = town_record();
        record.as_object_mut().unwrap().remove("nombre");
        assert!(matches!(
            Town::new(record.as_object().unwrap(), 1.0),
            Err(LocateError::InvalidRecord { field: "nombre", .. })
        ));
    }

    #[test]
    fn hourly_update_replaces_the_series() {
        let town = town();
        let updated = town
            .with_hourly_at(&hourly_table(&["2024-07-01T00:00:00", "2024-07-02T00:00:00"]), now())
            .unwrap();
        assert!(town.hourly().is_none());
        assert_eq!(updated.hourly().unwrap().forecast().len(), 36);

        let replaced = updated
            .with_hourly_at(&hourly_table(&["2024-07-01T00:00:00"]), now())
            .unwrap();
        assert_eq!(replaced.hourly().unwrap().forecast().len(), 12);
    }

    #[test]
    fn failed_update_keeps_nothing_half_built() {
        let town = town();
        assert!(matches!(
            town.with_daily_at(&json!("not a table"), now()),
            Err(ForecastError::InvalidTable)
        ));
        assert!(town.daily().is_none());
    }

    #[test]
    fn data_view_nests_series() {
        let town = town()
            .with_hourly_at(&hourly_table(&["2024-07-01T00:00:00"]), now())
            .unwrap();
        let data = serde_json::to_value(town.data_at(now())).unwrap();
        assert_eq!(data["id"], "28079");
        assert_eq!(data["distance"], 0.412);
        assert_eq!(data["timezone"], "Europe/Madrid");
        assert_eq!(data["forecast-hourly"]["forecast-current"]["temperature"], 22);
        assert!(data.get("forecast-daily").is_none());
    }

    #[test]
    fn sources_without_series_are_empty() {
        let town = town();
        assert_eq!(town.weather_daily_at(now()), WeatherSource::default());
        assert_eq!(town.weather_hourly_at(now()), WeatherSource::default());
    }
}
