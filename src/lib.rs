mod aemet;
mod error;
mod forecast;
mod stations;
mod types;
mod utils;
mod weather;

pub use aemet::*;
pub use error::AemetError;

pub use forecast::daily_forecast::{DailyForecast, DailyForecastSeriesData};
pub use forecast::daily_value::{DailyForecastData, DailyForecastValue};
pub use forecast::error::ForecastError;
pub use forecast::hourly_forecast::{HourlyForecast, HourlyForecastSeriesData};
pub use forecast::hourly_value::{HourlyForecastData, HourlyForecastValue};
pub use forecast::Timestamps;

pub use stations::distance::{geodesic_km, great_circle_km, DistanceMetric};
pub use stations::error::LocateError;
pub use stations::locate::{
    climate_station_location, station_location, town_location, Catalog, Nearest,
};

pub use types::coordinates::{parse_dms, parse_town_code, timezone_from_coords, LatLon};
pub use types::period::*;
pub use types::raw::*;
pub use types::station::{ClimateStation, Station, StationData, StationSample};
pub use types::town::{Town, TownData};
pub use types::units::*;
pub use types::weather_condition::{Condition, WeatherCondition};

pub use utils::{current_datetime, parse_api_timestamp};
pub use weather::{Weather, WeatherSource};
