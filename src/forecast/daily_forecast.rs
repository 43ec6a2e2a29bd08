use crate::forecast::daily_value::{DailyForecastData, DailyForecastValue};
use crate::forecast::error::ForecastError;
use crate::forecast::{day_date, keep_slot, table_days, table_record, table_timestamp, Timestamps};
use crate::utils::{current_datetime, local_datetime};
use crate::weather::WeatherSource;
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

/// Day-by-day forecast of a locality, from today onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    datetime: DateTime<Utc>,
    timezone: Tz,
    forecast: Vec<DailyForecastValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DailyForecastSeriesData {
    pub forecast: Vec<DailyForecastData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_current: Option<DailyForecastData>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub timezone: Tz,
}

impl DailyForecast {
    pub fn new(table: &Value, timezone: Tz) -> Result<Self, ForecastError> {
        Self::new_at(table, timezone, Utc::now())
    }

    /// Builds the series from a daily table as if the current instant were `now`.
    ///
    /// Days before today are never built. A day that cannot be represented is
    /// dropped; a malformed table fails the whole series.
    pub fn new_at(table: &Value, timezone: Tz, now: DateTime<Utc>) -> Result<Self, ForecastError> {
        let record = table_record(table).ok_or(ForecastError::InvalidTable)?;
        let datetime = table_timestamp(record)?;
        let today = current_datetime(timezone, now).date_naive();

        let mut forecast = Vec::new();
        for day in table_days(record) {
            let Some(date) = day_date(day) else {
                continue;
            };
            if date < today {
                continue;
            }
            let value = local_datetime(timezone, date.and_time(NaiveTime::MIN))
                .and_then(|midnight| DailyForecastValue::new(day, midnight));
            if let Some(value) = keep_slot(value)? {
                forecast.push(value);
            }
        }

        Ok(DailyForecast {
            datetime,
            timezone,
            forecast,
        })
    }

    /// When the provider elaborated the forecast.
    pub fn datetime(&self) -> DateTime<Utc> {
        self.datetime
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn forecast(&self) -> &[DailyForecastValue] {
        &self.forecast
    }

    /// The entry for the local date of `now`.
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&DailyForecastValue> {
        let today = current_datetime(self.timezone, now).date_naive();
        self.forecast
            .iter()
            .find(|value| value.datetime.date_naive() == today)
    }

    pub fn current(&self) -> Option<&DailyForecastValue> {
        self.current_at(Utc::now())
    }

    pub fn data_at(&self, now: DateTime<Utc>) -> DailyForecastSeriesData {
        let today = current_datetime(self.timezone, now).date_naive();
        DailyForecastSeriesData {
            forecast: self
                .forecast
                .iter()
                .filter(|value| value.datetime.date_naive() >= today)
                .map(DailyForecastValue::data)
                .collect(),
            forecast_current: self.current_at(now).map(DailyForecastValue::data),
            timestamps: Timestamps::new(&self.datetime.with_timezone(&self.timezone)),
            timezone: self.timezone,
        }
    }

    pub fn data(&self) -> DailyForecastSeriesData {
        self.data_at(Utc::now())
    }

    /// What today's entry contributes to the merged weather.
    pub fn weather_at(&self, now: DateTime<Utc>) -> WeatherSource {
        let Some(current) = self.current_at(now) else {
            return WeatherSource::default();
        };
        WeatherSource {
            condition: Some(current.condition.clone()),
            precipitation_probability: Some(current.precipitation_probability),
            uv_index: current.uv_index,
            wind_direction: current.wind_direction,
            wind_speed: current.wind_speed,
            ..WeatherSource::default()
        }
    }
}
