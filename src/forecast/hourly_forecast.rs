use crate::forecast::error::ForecastError;
use crate::forecast::hourly_value::{HourlyForecastData, HourlyForecastValue};
use crate::forecast::{day_date, keep_slot, table_days, table_record, table_timestamp, Timestamps};
use crate::utils::{current_datetime, local_datetime};
use crate::weather::WeatherSource;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

const HOURS_PER_DAY: u32 = 24;

/// Hour-by-hour forecast of a locality, from the current hour onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecast {
    datetime: DateTime<Utc>,
    timezone: Tz,
    forecast: Vec<HourlyForecastValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HourlyForecastSeriesData {
    pub forecast: Vec<HourlyForecastData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_current: Option<HourlyForecastData>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub timezone: Tz,
}

impl HourlyForecast {
    pub fn new(table: &Value, timezone: Tz) -> Result<Self, ForecastError> {
        Self::new_at(table, timezone, Utc::now())
    }

    /// Builds the series from an hourly table as if the current instant were `now`.
    ///
    /// Today starts at the current local hour, later days at midnight. Each
    /// hour that cannot be represented (no sky state, a DST gap) is dropped.
    pub fn new_at(table: &Value, timezone: Tz, now: DateTime<Utc>) -> Result<Self, ForecastError> {
        let record = table_record(table).ok_or(ForecastError::InvalidTable)?;
        let datetime = table_timestamp(record)?;
        let current = current_datetime(timezone, now);
        let today = current.date_naive();

        let mut forecast = Vec::new();
        for day in table_days(record) {
            let Some(date) = day_date(day) else {
                continue;
            };
            if date < today {
                continue;
            }
            let start_hour = if date == today { current.hour() } else { 0 };
            for hour in start_hour..HOURS_PER_DAY {
                let Some(naive) = date.and_hms_opt(hour, 0, 0) else {
                    continue;
                };
                let value = local_datetime(timezone, naive)
                    .and_then(|slot| HourlyForecastValue::new(day, slot));
                if let Some(value) = keep_slot(value)? {
                    forecast.push(value);
                }
            }
        }

        Ok(HourlyForecast {
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

    pub fn forecast(&self) -> &[HourlyForecastValue] {
        &self.forecast
    }

    /// The entry for the hour `now` falls in.
    ///
    /// Each wall-clock hour has one entry, keyed on its first occurrence, so
    /// the repeated hour at the end of summer time resolves to that same entry.
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&HourlyForecastValue> {
        let current = current_datetime(self.timezone, now);
        self.forecast
            .iter()
            .find(|value| value.datetime == current)
            .or_else(|| {
                let wall_clock = current.naive_local();
                self.forecast
                    .iter()
                    .find(|value| value.datetime.naive_local() == wall_clock)
            })
    }

    pub fn current(&self) -> Option<&HourlyForecastValue> {
        self.current_at(Utc::now())
    }

    pub fn data_at(&self, now: DateTime<Utc>) -> HourlyForecastSeriesData {
        let current = current_datetime(self.timezone, now);
        HourlyForecastSeriesData {
            forecast: self
                .forecast
                .iter()
                .filter(|value| value.datetime >= current)
                .map(HourlyForecastValue::data)
                .collect(),
            forecast_current: self.current_at(now).map(HourlyForecastValue::data),
            timestamps: Timestamps::new(&self.datetime.with_timezone(&self.timezone)),
            timezone: self.timezone,
        }
    }

    pub fn data(&self) -> HourlyForecastSeriesData {
        self.data_at(Utc::now())
    }

    /// What the current hour contributes to the merged weather.
    pub fn weather_at(&self, now: DateTime<Utc>) -> WeatherSource {
        let Some(current) = self.current_at(now) else {
            return WeatherSource::default();
        };
        WeatherSource {
            condition: Some(current.condition.clone()),
            feel_temperature: current.feel_temperature.map(|t| t as f64),
            humidity: current.humidity.map(|h| h as f64),
            precipitation: current.precipitation(),
            precipitation_probability: current.precipitation_probability(),
            rain: current.rain,
            rain_probability: current.rain_probability,
            snow: current.snow,
            snow_probability: current.snow_probability,
            storm_probability: current.storm_probability,
            temperature: current.temperature.map(|t| t as f64),
            wind_direction: current.wind_direction,
            wind_speed: current.wind_speed,
            wind_speed_max: current.wind_speed_max,
            ..WeatherSource::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::forecast::hourly_value::tests::hourly_day_record;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn hourly_table(dates: &[&str]) -> Value {
        let days: Vec<Value> = dates.iter().map(|date| hourly_day_record(date)).collect();
        json!([{
            "elaborado": "2024-07-01T07:00:00",
            "nombre": "Madrid",
            "prediccion": { "dia": days },
            "id": "28079"
        }])
    }

    fn now() -> DateTime<Utc> {
        // 12:45 local
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 45, 0).unwrap()
    }

    #[test]
    fn today_starts_at_current_hour() {
        let table = hourly_table(&["2024-06-30T00:00:00", "2024-07-01T00:00:00", "2024-07-02T00:00:00"]);
        let hourly = HourlyForecast::new_at(&table, Tz::Europe__Madrid, now()).unwrap();

        // 12..24 today plus a full tomorrow
        assert_eq!(hourly.forecast().len(), 12 + 24);
        let first = &hourly.forecast()[0];
        assert_eq!(
            first.datetime,
            Tz::Europe__Madrid.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(first.temperature, Some(22));
    }

    #[test]
    fn current_hour_lookup() {
        let table = hourly_table(&["2024-07-01T00:00:00"]);
        let hourly = HourlyForecast::new_at(&table, Tz::Europe__Madrid, now()).unwrap();
        assert_eq!(hourly.current_at(now()).unwrap().temperature, Some(22));

        let later = Utc.with_ymd_and_hms(2024, 7, 1, 13, 5, 0).unwrap();
        let current = hourly.current_at(later).unwrap();
        assert_eq!(current.temperature, Some(25));

        // before the series starts
        let earlier = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        assert!(hourly.current_at(earlier).is_none());
    }

    #[test]
    fn hours_without_condition_are_dropped() {
        let mut table = hourly_table(&["2024-07-01T00:00:00"]);
        let sky = table[0]["prediccion"]["dia"][0]["estadoCielo"]
            .as_array_mut()
            .unwrap();
        sky.retain(|row| row["periodo"] != "14");
        let hourly = HourlyForecast::new_at(&table, Tz::Europe__Madrid, now()).unwrap();
        assert_eq!(hourly.forecast().len(), 11);
        let at_two = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        assert!(hourly.current_at(at_two).is_none());
    }

    #[test]
    fn malformed_interval_period_fails_the_series() {
        let mut table = hourly_table(&["2024-07-01T00:00:00"]);
        table[0]["prediccion"]["dia"][0]["probTormenta"] =
            json!([{ "value": "10", "periodo": "14-20" }]);
        assert!(matches!(
            HourlyForecast::new_at(&table, Tz::Europe__Madrid, now()),
            Err(ForecastError::MalformedPeriod(_))
        ));
    }

    #[test]
    fn spring_forward_gap_hour_is_skipped() {
        let table = hourly_table(&["2024-03-31T00:00:00"]);
        let midnight = Utc.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap();
        let hourly = HourlyForecast::new_at(&table, Tz::Europe__Madrid, midnight).unwrap();
        assert_eq!(hourly.forecast().len(), 23);
    }

    #[test]
    fn repeated_autumn_hour_resolves_both_times() {
        let table = hourly_table(&["2024-10-27T00:00:00"]);
        // local midnight, still summer time
        let midnight = Utc.with_ymd_and_hms(2024, 10, 26, 22, 0, 0).unwrap();
        let hourly = HourlyForecast::new_at(&table, Tz::Europe__Madrid, midnight).unwrap();
        assert_eq!(hourly.forecast().len(), 24);

        // 02:00 local happens at 00:00 and again at 01:00 UTC
        let first = Utc.with_ymd_and_hms(2024, 10, 27, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 10, 27, 1, 0, 0).unwrap();
        assert_eq!(hourly.current_at(first).unwrap().temperature, Some(12));
        assert_eq!(hourly.current_at(second).unwrap().temperature, Some(12));

        let after = Utc.with_ymd_and_hms(2024, 10, 27, 2, 0, 0).unwrap();
        assert_eq!(hourly.current_at(after).unwrap().temperature, Some(13));
    }

    #[test]
    fn data_and_weather_views() {
        let table = hourly_table(&["2024-07-01T00:00:00"]);
        let hourly = HourlyForecast::new_at(&table, Tz::Europe__Madrid, now()).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 7, 1, 13, 0, 0).unwrap();

        let data = serde_json::to_value(hourly.data_at(later)).unwrap();
        assert_eq!(data["forecast"].as_array().unwrap().len(), 9);
        assert_eq!(data["forecast-current"]["temperature"], 25);

        let weather = hourly.weather_at(later);
        assert_eq!(weather.temperature, Some(25.0));
        assert_eq!(weather.precipitation_probability, Some(60));
        assert_eq!(weather.wind_speed_max, Some(30.0));
        assert_eq!(weather.uv_index, None);
    }
}
