use crate::forecast::error::ForecastError;
use crate::forecast::{
    parse_float, parse_int, Timestamps, ATTR_DIRECTION, ATTR_FEEL_TEMPERATURE, ATTR_HUMIDITY,
    ATTR_PRECIPITATION, ATTR_PRECIPITATION_PROBABILITY, ATTR_SKY_STATE, ATTR_SNOW,
    ATTR_SNOW_PROBABILITY, ATTR_SPEED, ATTR_STORM_PROBABILITY, ATTR_SUNRISE, ATTR_SUNSET,
    ATTR_TEMPERATURE, ATTR_WIND_GUST,
};
use crate::types::period::{hour_value, interval_value, VALUE_KEY};
use crate::types::raw::{first_element, value_as_string, RawRecord, RawValue};
use crate::types::units::{parse_precipitation, parse_wind_direction};
use crate::types::weather_condition::Condition;
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

/// One hour of a locality forecast.
///
/// Rain and snow come in (amount, probability) pairs: the amount is only
/// resolved when its probability is, but may still be absent on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecastValue {
    pub condition: Condition,
    pub datetime: DateTime<Tz>,
    pub feel_temperature: Option<i64>,
    pub humidity: Option<i64>,
    pub rain: Option<f64>,
    pub rain_probability: Option<i64>,
    pub snow: Option<f64>,
    pub snow_probability: Option<i64>,
    pub storm_probability: Option<i64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub temperature: Option<i64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HourlyForecastData {
    pub condition: Condition,
    pub feel_temperature: Option<i64>,
    pub humidity: Option<i64>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<i64>,
    pub rain: Option<f64>,
    pub rain_probability: Option<i64>,
    pub snow: Option<f64>,
    pub snow_probability: Option<i64>,
    pub storm_probability: Option<i64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub temperature: Option<i64>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

fn hour_int(record: &RawRecord, attribute: &str, hour: u32) -> Result<Option<i64>, ForecastError> {
    hour_value(&RawValue::attribute(record, attribute), hour, VALUE_KEY)?
        .map(|value| parse_int(attribute, value))
        .transpose()
}

fn interval_int(
    record: &RawRecord,
    attribute: &str,
    hour: u32,
) -> Result<Option<i64>, ForecastError> {
    interval_value(&RawValue::attribute(record, attribute), hour, VALUE_KEY)?
        .map(|value| parse_int(attribute, value))
        .transpose()
}

// Amount only when the paired probability resolved.
fn precipitation_pair(
    record: &RawRecord,
    amount_attribute: &str,
    probability_attribute: &str,
    hour: u32,
) -> Result<(Option<f64>, Option<i64>), ForecastError> {
    let Some(probability) = interval_int(record, probability_attribute, hour)? else {
        return Ok((None, None));
    };
    let amount = hour_value(&RawValue::attribute(record, amount_attribute), hour, VALUE_KEY)?
        .map(|value| parse_precipitation(amount_attribute, value))
        .transpose()?;
    Ok((amount, Some(probability)))
}

impl HourlyForecastValue {
    /// Builds the slice of `record` (one forecast day) for the hour of `datetime`.
    ///
    /// Fails with [`ForecastError::MissingCondition`] when the hour has no sky
    /// state; the caller drops such hours.
    pub fn new(record: &RawRecord, datetime: DateTime<Tz>) -> Result<Self, ForecastError> {
        let hour = datetime.hour();

        let condition = hour_value(&RawValue::attribute(record, ATTR_SKY_STATE), hour, VALUE_KEY)?
            .and_then(value_as_string)
            .ok_or_else(|| ForecastError::MissingCondition(datetime.to_rfc3339()))?;

        let (rain, rain_probability) =
            precipitation_pair(record, ATTR_PRECIPITATION, ATTR_PRECIPITATION_PROBABILITY, hour)?;
        let (snow, snow_probability) =
            precipitation_pair(record, ATTR_SNOW, ATTR_SNOW_PROBABILITY, hour)?;

        let gust = RawValue::attribute(record, ATTR_WIND_GUST);
        let wind_direction = hour_value(&gust, hour, ATTR_DIRECTION)?
            .and_then(first_element)
            .and_then(Value::as_str)
            .and_then(parse_wind_direction);
        let (wind_speed, wind_speed_max) = match wind_direction {
            Some(_) => (
                hour_value(&gust, hour, ATTR_SPEED)?
                    .and_then(first_element)
                    .map(|speed| parse_float(ATTR_SPEED, speed))
                    .transpose()?,
                hour_value(&gust, hour, VALUE_KEY)?
                    .map(|max| parse_float(ATTR_WIND_GUST, max))
                    .transpose()?,
            ),
            None => (None, None),
        };

        Ok(HourlyForecastValue {
            condition: Condition::parse(&condition),
            datetime,
            feel_temperature: hour_int(record, ATTR_FEEL_TEMPERATURE, hour)?,
            humidity: hour_int(record, ATTR_HUMIDITY, hour)?,
            rain,
            rain_probability,
            snow,
            snow_probability,
            storm_probability: interval_int(record, ATTR_STORM_PROBABILITY, hour)?,
            sunrise: record.get(ATTR_SUNRISE).and_then(value_as_string),
            sunset: record.get(ATTR_SUNSET).and_then(value_as_string),
            temperature: hour_int(record, ATTR_TEMPERATURE, hour)?,
            wind_direction,
            wind_speed,
            wind_speed_max,
        })
    }

    /// Rain plus snow, a missing component counting as zero. `None` when both are missing.
    pub fn precipitation(&self) -> Option<f64> {
        match (self.rain, self.snow) {
            (None, None) => None,
            (rain, snow) => Some(rain.unwrap_or(0.0) + snow.unwrap_or(0.0)),
        }
    }

    /// The larger of the rain and snow probabilities. `None` when both are missing.
    pub fn precipitation_probability(&self) -> Option<i64> {
        match (self.rain_probability, self.snow_probability) {
            (None, None) => None,
            (rain, snow) => Some(rain.unwrap_or(0).max(snow.unwrap_or(0))),
        }
    }

    pub fn data(&self) -> HourlyForecastData {
        HourlyForecastData {
            condition: self.condition.clone(),
            feel_temperature: self.feel_temperature,
            humidity: self.humidity,
            precipitation: self.precipitation(),
            precipitation_probability: self.precipitation_probability(),
            rain: self.rain,
            rain_probability: self.rain_probability,
            snow: self.snow,
            snow_probability: self.snow_probability,
            storm_probability: self.storm_probability,
            sunrise: self.sunrise.clone(),
            sunset: self.sunset.clone(),
            temperature: self.temperature,
            timestamps: Timestamps::new(&self.datetime),
            wind_direction: self.wind_direction,
            wind_speed: self.wind_speed,
            wind_speed_max: self.wind_speed_max,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn hour_rows(row: impl Fn(u32, String) -> Value) -> Value {
        Value::Array((0..24u32).map(|h| row(h, format!("{h:02}"))).collect())
    }

    /// A forecast day with every hour populated; temperature is `10 + hour`.
    pub(crate) fn hourly_day_record(date: &str) -> Value {
        let sky = hour_rows(|h, period| {
            let code = if h < 7 || h > 21 { "11n" } else { "12" };
            json!({ "value": code, "periodo": period, "descripcion": "" })
        });
        let rain = hour_rows(|h, period| {
            let amount = if h == 15 { "Ip" } else { "0" };
            json!({ "value": amount, "periodo": period })
        });
        let wind: Vec<Value> = (0..24u32)
            .flat_map(|h| {
                let direction = if h == 3 { "C" } else { "SO" };
                let period = format!("{h:02}");
                [
                    json!({ "direccion": [direction], "velocidad": ["12"], "periodo": period }),
                    json!({ "value": "30", "periodo": period }),
                ]
            })
            .collect();
        json!({
            "estadoCielo": sky,
            "precipitacion": rain,
            "probPrecipitacion": [
                { "value": "10", "periodo": "0208" },
                { "value": "20", "periodo": "0814" },
                { "value": "60", "periodo": "1420" },
                { "value": "5", "periodo": "2002" }
            ],
            "probTormenta": [
                { "value": "0", "periodo": "0208" },
                { "value": "", "periodo": "0814" },
                { "value": "25", "periodo": "1420" },
                { "value": "0", "periodo": "2002" }
            ],
            "nieve": hour_rows(|_, period| json!({ "value": "0", "periodo": period })),
            "probNieve": [
                { "value": "", "periodo": "0208" },
                { "value": "", "periodo": "0814" },
                { "value": "", "periodo": "1420" },
                { "value": "", "periodo": "2002" }
            ],
            "temperatura": hour_rows(|h, period| json!({ "value": (10 + h).to_string(), "periodo": period })),
            "sensTermica": hour_rows(|h, period| json!({ "value": (9 + h).to_string(), "periodo": period })),
            "humedadRelativa": hour_rows(|_, period| json!({ "value": "70", "periodo": period })),
            "vientoAndRachaMax": wind,
            "fecha": date,
            "orto": "07:01",
            "ocaso": "21:45"
        })
    }

    fn madrid(hour: u32) -> DateTime<Tz> {
        Tz::Europe__Madrid.with_ymd_and_hms(2024, 7, 1, hour, 0, 0).unwrap()
    }

    fn slice(
        rain: Option<f64>,
        snow: Option<f64>,
        rain_probability: Option<i64>,
        snow_probability: Option<i64>,
    ) -> HourlyForecastValue {
        HourlyForecastValue {
            condition: Condition::parse("12"),
            datetime: madrid(12),
            feel_temperature: None,
            humidity: None,
            rain,
            rain_probability,
            snow,
            snow_probability,
            storm_probability: None,
            sunrise: None,
            sunset: None,
            temperature: None,
            wind_direction: None,
            wind_speed: None,
            wind_speed_max: None,
        }
    }

    #[test]
    fn derived_precipitation() {
        assert_eq!(slice(None, None, None, None).precipitation(), None);
        assert_eq!(slice(Some(2.0), None, None, None).precipitation(), Some(2.0));
        assert_eq!(slice(Some(1.0), Some(0.5), None, None).precipitation(), Some(1.5));
    }

    #[test]
    fn derived_precipitation_probability() {
        assert_eq!(slice(None, None, None, None).precipitation_probability(), None);
        assert_eq!(slice(None, None, Some(30), None).precipitation_probability(), Some(30));
        assert_eq!(slice(None, None, None, Some(60)).precipitation_probability(), Some(60));
        assert_eq!(slice(None, None, Some(20), Some(80)).precipitation_probability(), Some(80));
    }

    #[test]
    fn builds_hour_slice() {
        let record = hourly_day_record("2024-07-01T00:00:00");
        let value = HourlyForecastValue::new(record.as_object().unwrap(), madrid(15)).unwrap();

        assert_eq!(value.condition.as_str(), "partly-cloudy");
        assert_eq!(value.temperature, Some(25));
        assert_eq!(value.feel_temperature, Some(24));
        assert_eq!(value.humidity, Some(70));
        assert_eq!(value.rain_probability, Some(60));
        assert_eq!(value.rain, Some(0.0));
        assert_eq!(value.snow_probability, None);
        assert_eq!(value.snow, None);
        assert_eq!(value.storm_probability, Some(25));
        assert_eq!(value.wind_direction, Some(225.0));
        assert_eq!(value.wind_speed, Some(12.0));
        assert_eq!(value.wind_speed_max, Some(30.0));
        assert_eq!(value.sunrise.as_deref(), Some("07:01"));
        assert_eq!(value.precipitation(), Some(0.0));
        assert_eq!(value.precipitation_probability(), Some(60));
    }

    #[test]
    fn empty_interval_cell_is_absent() {
        let record = hourly_day_record("2024-07-01T00:00:00");
        let value = HourlyForecastValue::new(record.as_object().unwrap(), madrid(9)).unwrap();
        assert_eq!(value.storm_probability, None);
    }

    #[test]
    fn calm_hour_has_no_wind_speed() {
        let record = hourly_day_record("2024-07-01T00:00:00");
        let value = HourlyForecastValue::new(record.as_object().unwrap(), madrid(3)).unwrap();
        assert_eq!(value.condition.as_str(), "clear-night");
        assert_eq!(value.wind_direction, None);
        assert_eq!(value.wind_speed, None);
        assert_eq!(value.wind_speed_max, None);
    }

    #[test]
    fn amount_without_probability_is_not_read() {
        let mut record = hourly_day_record("2024-07-01T00:00:00");
        record["probPrecipitacion"] = json!([]);
        record["precipitacion"] = json!([{ "value": "3.5", "periodo": "15" }]);
        let value = HourlyForecastValue::new(record.as_object().unwrap(), madrid(15)).unwrap();
        assert_eq!(value.rain, None);
        assert_eq!(value.rain_probability, None);
        assert_eq!(value.precipitation(), None);
    }

    #[test]
    fn hour_without_condition_is_rejected() {
        let mut record = hourly_day_record("2024-07-01T00:00:00");
        record["estadoCielo"] = json!([{ "value": "12", "periodo": "08" }]);
        let result = HourlyForecastValue::new(record.as_object().unwrap(), madrid(9));
        assert!(matches!(result, Err(ForecastError::MissingCondition(_))));
    }

    #[test]
    fn data_view_includes_derived_fields() {
        let record = hourly_day_record("2024-07-01T00:00:00");
        let value = HourlyForecastValue::new(record.as_object().unwrap(), madrid(15)).unwrap();
        let data = serde_json::to_value(value.data()).unwrap();
        assert_eq!(data["precipitation-probability"], 60);
        assert_eq!(data["wind-speed-max"], 30.0);
        assert_eq!(data["timestamp-local"], "2024-07-01T15:00:00+02:00");
        assert_eq!(data["timestamp-utc"], "2024-07-01T13:00:00+00:00");
    }
}
