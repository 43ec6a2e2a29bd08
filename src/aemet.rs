//! This module provides the main entry point of the crate: selecting the
//! locality and station for a pair of coordinates, feeding them provider data
//! and reading back one merged weather snapshot.

use crate::error::AemetError;
use crate::stations::distance::DistanceMetric;
use crate::stations::error::LocateError;
use crate::stations::locate::Catalog;
use crate::types::coordinates::LatLon;
use crate::types::raw::RawRecord;
use crate::types::station::{ClimateStation, Station, StationData};
use crate::types::town::{Town, TownData};
use crate::utils::current_datetime;
use crate::weather::{Weather, WeatherSource};
use bon::{bon, Builder};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, error};
use serde::Serialize;
use serde_json::Value;

/// Search radius used for both towns and stations unless overridden.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 40.0;
/// Age after which a station sample no longer contributes to the weather.
pub const DEFAULT_STATION_MAX_AGE_HOURS: i64 = 2;

/// Behaviour switches for [`Aemet`].
///
/// # Examples
///
/// ```
/// use aemet_weather::AemetOptions;
///
/// let options = AemetOptions::builder()
///     .station_data(true)
///     .town_max_distance_km(25.0)
///     .build();
/// assert!(options.station_data);
/// assert!(!options.high_precision);
/// assert_eq!(options.station_max_distance_km, 40.0);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct AemetOptions {
    /// Whether [`Aemet::select_coordinates`] also looks for an observation station.
    #[builder(default)]
    pub station_data: bool,
    /// Geodesic distances instead of great-circle ones.
    #[builder(default)]
    pub high_precision: bool,
    #[builder(default = DEFAULT_MAX_DISTANCE_KM)]
    pub station_max_distance_km: f64,
    #[builder(default = DEFAULT_MAX_DISTANCE_KM)]
    pub town_max_distance_km: f64,
    #[builder(default = TimeDelta::hours(DEFAULT_STATION_MAX_AGE_HOURS))]
    pub station_max_age: TimeDelta,
}

impl Default for AemetOptions {
    fn default() -> Self {
        AemetOptions::builder().build()
    }
}

/// Serializable view of the whole client state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AemetData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<StationData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub town: Option<TownData>,
    pub weather: Weather,
    pub timestamp_utc: String,
}

/// The weather engine for one pair of selected coordinates.
///
/// It owns the provider catalogs (towns, observation stations and
/// climatological stations) and, after [`Aemet::select_coordinates`], the
/// closest [`Town`] and optionally the closest [`Station`]. Forecast tables and
/// sample batches fetched by the caller are fed through the `update_*` methods;
/// each one replaces only the state it owns.
///
/// # Examples
///
/// ```
/// use aemet_weather::{Aemet, AemetError, LatLon};
/// use serde_json::json;
///
/// # fn main() -> Result<(), AemetError> {
/// let madrid = json!({
///     "id": "id28079",
///     "nombre": "Madrid",
///     "latitud_dec": "40.4165",
///     "longitud_dec": "-3.70256",
///     "altitud": "657",
///     "num_hab": "3223334"
/// });
/// let mut aemet = Aemet::builder()
///     .towns(vec![madrid.as_object().cloned().unwrap_or_default()])
///     .build();
///
/// aemet.select_coordinates(LatLon(40.42, -3.70))?;
/// let town = aemet.town().ok_or(AemetError::NoTownSelected)?;
/// assert_eq!(town.id, "28079");
/// assert!(aemet.station().is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Aemet {
    options: AemetOptions,
    metric: DistanceMetric,
    towns: Catalog,
    stations: Catalog,
    climate_stations: Catalog,
    coordinates: Option<LatLon>,
    station: Option<Station>,
    town: Option<Town>,
}

#[bon]
impl Aemet {
    /// Creates the engine from the provider catalogs.
    ///
    /// * `.options(AemetOptions)`: Optional. Defaults to [`AemetOptions::default`].
    /// * `.towns(Vec<RawRecord>)`: Optional. Locality master records.
    /// * `.stations(Vec<RawRecord>)`: Optional. Observation station records (decimal coordinates).
    /// * `.climate_stations(Vec<RawRecord>)`: Optional. Climatological inventory records (sexagesimal coordinates).
    #[builder]
    pub fn new(
        options: Option<AemetOptions>,
        towns: Option<Vec<RawRecord>>,
        stations: Option<Vec<RawRecord>>,
        climate_stations: Option<Vec<RawRecord>>,
    ) -> Self {
        let options = options.unwrap_or_default();
        Aemet {
            metric: DistanceMetric::from_high_precision(options.high_precision),
            options,
            towns: Catalog::towns(towns.unwrap_or_default()),
            stations: Catalog::stations(stations.unwrap_or_default()),
            climate_stations: Catalog::climate_stations(climate_stations.unwrap_or_default()),
            coordinates: None,
            station: None,
            town: None,
        }
    }

    pub fn options(&self) -> &AemetOptions {
        &self.options
    }

    pub fn coordinates(&self) -> Option<LatLon> {
        self.coordinates
    }

    pub fn station(&self) -> Option<&Station> {
        self.station.as_ref()
    }

    pub fn town(&self) -> Option<&Town> {
        self.town.as_ref()
    }

    /// Switches between geodesic (`true`) and great-circle (`false`) distances
    /// for subsequent lookups.
    pub fn distance_high_precision(&mut self, high_precision: bool) {
        self.options.high_precision = high_precision;
        self.metric = DistanceMetric::from_high_precision(high_precision);
    }

    /// Finds the town closest to `location`.
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.max_distance_km(f64)`: Optional. Defaults to `town_max_distance_km`.
    ///
    /// # Errors
    ///
    /// [`LocateError::TownNotFound`] when no town lies within the radius.
    #[builder]
    pub fn find_town(
        &self,
        location: LatLon,
        max_distance_km: Option<f64>,
    ) -> Result<Town, LocateError> {
        let max_distance_km = max_distance_km.unwrap_or(self.options.town_max_distance_km);
        let nearest = self
            .towns
            .nearest(location, max_distance_km, self.metric)
            .ok_or(LocateError::TownNotFound {
                latitude: location.0,
                longitude: location.1,
                max_distance_km,
            })?;
        Town::new(nearest.record, nearest.distance_km)
    }

    /// Finds the observation station closest to `location`.
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.max_distance_km(f64)`: Optional. Defaults to `station_max_distance_km`.
    #[builder]
    pub fn find_station(
        &self,
        location: LatLon,
        max_distance_km: Option<f64>,
    ) -> Result<Station, LocateError> {
        let max_distance_km = max_distance_km.unwrap_or(self.options.station_max_distance_km);
        let nearest = self
            .stations
            .nearest(location, max_distance_km, self.metric)
            .ok_or(LocateError::StationNotFound {
                latitude: location.0,
                longitude: location.1,
                max_distance_km,
            })?;
        Station::new(nearest.record, nearest.distance_km)
    }

    /// Finds the climatological station closest to `location`.
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.max_distance_km(f64)`: Optional. Defaults to `station_max_distance_km`.
    #[builder]
    pub fn find_climate_station(
        &self,
        location: LatLon,
        max_distance_km: Option<f64>,
    ) -> Result<ClimateStation, LocateError> {
        let max_distance_km = max_distance_km.unwrap_or(self.options.station_max_distance_km);
        let nearest = self
            .climate_stations
            .nearest(location, max_distance_km, self.metric)
            .ok_or(LocateError::StationNotFound {
                latitude: location.0,
                longitude: location.1,
                max_distance_km,
            })?;
        ClimateStation::new(nearest.record, nearest.distance_km)
    }

    /// Selects the town and, when `station_data` is enabled, the station
    /// closest to `location`.
    ///
    /// A missing station is logged and leaves the engine without one. A
    /// missing town fails the call and keeps the previous selection.
    pub fn select_coordinates(&mut self, location: LatLon) -> Result<(), AemetError> {
        let station = if self.options.station_data {
            match self.find_station().location(location).call() {
                Ok(station) => Some(station),
                Err(err) => {
                    error!("No station selected: {err}");
                    None
                }
            }
        } else {
            None
        };
        let town = self.find_town().location(location).call()?;
        debug!("Selected town {} ({:.3} km)", town.id, town.distance_km);

        self.coordinates = Some(location);
        self.station = station;
        self.town = Some(town);
        Ok(())
    }

    fn selected_town(&self) -> Result<&Town, AemetError> {
        self.town.as_ref().ok_or(AemetError::NoTownSelected)
    }

    /// Rebuilds the town's daily series from a daily forecast table.
    pub fn update_daily_at(&mut self, table: &Value, now: DateTime<Utc>) -> Result<(), AemetError> {
        let town = self.selected_town()?.with_daily_at(table, now)?;
        self.town = Some(town);
        Ok(())
    }

    pub fn update_daily(&mut self, table: &Value) -> Result<(), AemetError> {
        self.update_daily_at(table, Utc::now())
    }

    /// Rebuilds the town's hourly series from an hourly forecast table.
    pub fn update_hourly_at(
        &mut self,
        table: &Value,
        now: DateTime<Utc>,
    ) -> Result<(), AemetError> {
        let town = self.selected_town()?.with_hourly_at(table, now)?;
        self.town = Some(town);
        Ok(())
    }

    pub fn update_hourly(&mut self, table: &Value) -> Result<(), AemetError> {
        self.update_hourly_at(table, Utc::now())
    }

    /// Offers a batch of station samples to the selected station. Without a
    /// selected station the batch is ignored.
    pub fn update_station_at(&mut self, samples: &Value, now: DateTime<Utc>) {
        let updated = self
            .station
            .as_ref()
            .map(|station| station.with_samples_at(samples, now));
        match updated {
            Some(station) => self.station = Some(station),
            None => debug!("Ignoring station samples, no station selected"),
        }
    }

    pub fn update_station(&mut self, samples: &Value) {
        self.update_station_at(samples, Utc::now())
    }

    /// The station's contribution, or nothing when its sample is too old.
    fn station_weather_at(&self, now: DateTime<Utc>) -> WeatherSource {
        match &self.station {
            Some(station) if !station.is_outdated_at(now, self.options.station_max_age) => {
                station.weather()
            }
            Some(station) => {
                debug!("Station {} is outdated", station.id);
                WeatherSource::default()
            }
            None => WeatherSource::default(),
        }
    }

    /// The merged weather at `now`.
    pub fn weather_at(&self, now: DateTime<Utc>) -> Weather {
        let station = self.station_weather_at(now);
        let (hourly, daily) = match &self.town {
            Some(town) => (town.weather_hourly_at(now), town.weather_daily_at(now)),
            None => (WeatherSource::default(), WeatherSource::default()),
        };
        Weather::merge(&station, &hourly, &daily)
    }

    pub fn weather(&self) -> Weather {
        self.weather_at(Utc::now())
    }

    pub fn data_at(&self, now: DateTime<Utc>) -> AemetData {
        AemetData {
            station: self
                .station
                .as_ref()
                .map(|station| station.data_at(now, self.options.station_max_age)),
            town: self.town.as_ref().map(|town| town.data_at(now)),
            weather: self.weather_at(now),
            timestamp_utc: current_datetime(chrono_tz::UTC, now).to_rfc3339(),
        }
    }

    pub fn data(&self) -> AemetData {
        self.data_at(Utc::now())
    }
}
