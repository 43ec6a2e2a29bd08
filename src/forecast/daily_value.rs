use crate::forecast::error::ForecastError;
use crate::forecast::{
    parse_float, parse_int, Timestamps, ATTR_DIRECTION, ATTR_FEEL_TEMPERATURE, ATTR_HUMIDITY,
    ATTR_MAX, ATTR_MIN, ATTR_PRECIPITATION_PROBABILITY, ATTR_SKY_STATE, ATTR_SPEED,
    ATTR_TEMPERATURE, ATTR_UV_MAX, ATTR_WIND,
};
use crate::types::period::{
    day_value_in, PERIOD_FULL_DAY, PERIOD_LAST_QUARTER_DAY, PERIOD_SECOND_HALF_DAY, VALUE_KEY,
};
use crate::types::raw::{is_empty_value, value_as_string, RawRecord, RawValue};
use crate::types::units::parse_wind_direction;
use crate::types::weather_condition::Condition;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// Periods tried, in order, when a day attribute is split into several rows.
const DAY_PERIODS: [&str; 3] = [
    PERIOD_FULL_DAY,
    PERIOD_SECOND_HALF_DAY,
    PERIOD_LAST_QUARTER_DAY,
];

/// One calendar day of a locality forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecastValue {
    pub condition: Condition,
    pub datetime: DateTime<Tz>,
    pub feel_temperature_max: i64,
    pub feel_temperature_min: i64,
    pub humidity_max: i64,
    pub humidity_min: i64,
    pub precipitation_probability: i64,
    pub temperature_max: i64,
    pub temperature_min: i64,
    pub uv_index: Option<i64>,
    pub wind_direction: Option<f64>,
    /// Only set when `wind_direction` is.
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DailyForecastData {
    pub condition: Condition,
    pub feel_temperature_max: i64,
    pub feel_temperature_min: i64,
    pub humidity_max: i64,
    pub humidity_min: i64,
    pub precipitation_probability: i64,
    pub temperature_max: i64,
    pub temperature_min: i64,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub uv_index: Option<i64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
}

fn day_cell<'a>(
    record: &'a RawRecord,
    attribute: &str,
    key: &str,
) -> Option<&'a serde_json::Value> {
    day_value_in(&RawValue::attribute(record, attribute), key, &DAY_PERIODS)
}

fn required_int(record: &RawRecord, attribute: &str, key: &str) -> Result<i64, ForecastError> {
    let name = format!("{attribute}.{key}");
    let value = day_cell(record, attribute, key)
        .ok_or_else(|| ForecastError::MissingAttribute(name.clone()))?;
    parse_int(&name, value)
}

impl DailyForecastValue {
    /// Builds the value for the day `record` describes, dated `datetime`.
    ///
    /// Fails with [`ForecastError::MissingCondition`] when the day carries no
    /// sky state; any other missing mandatory attribute is a
    /// [`ForecastError::MissingAttribute`].
    pub fn new(record: &RawRecord, datetime: DateTime<Tz>) -> Result<Self, ForecastError> {
        let condition = day_cell(record, ATTR_SKY_STATE, VALUE_KEY)
            .and_then(value_as_string)
            .ok_or_else(|| ForecastError::MissingCondition(datetime.to_rfc3339()))?;

        let wind_direction = day_cell(record, ATTR_WIND, ATTR_DIRECTION)
            .and_then(|direction| direction.as_str())
            .and_then(parse_wind_direction);
        let wind_speed = match wind_direction {
            Some(_) => day_cell(record, ATTR_WIND, ATTR_SPEED)
                .map(|speed| parse_float(ATTR_SPEED, speed))
                .transpose()?,
            None => None,
        };

        let uv_index = record
            .get(ATTR_UV_MAX)
            .filter(|uv| !is_empty_value(uv))
            .map(|uv| parse_int(ATTR_UV_MAX, uv))
            .transpose()?;

        Ok(DailyForecastValue {
            condition: Condition::parse(&condition),
            datetime,
            feel_temperature_max: required_int(record, ATTR_FEEL_TEMPERATURE, ATTR_MAX)?,
            feel_temperature_min: required_int(record, ATTR_FEEL_TEMPERATURE, ATTR_MIN)?,
            humidity_max: required_int(record, ATTR_HUMIDITY, ATTR_MAX)?,
            humidity_min: required_int(record, ATTR_HUMIDITY, ATTR_MIN)?,
            precipitation_probability: required_int(
                record,
                ATTR_PRECIPITATION_PROBABILITY,
                VALUE_KEY,
            )?,
            temperature_max: required_int(record, ATTR_TEMPERATURE, ATTR_MAX)?,
            temperature_min: required_int(record, ATTR_TEMPERATURE, ATTR_MIN)?,
            uv_index,
            wind_direction,
            wind_speed,
        })
    }

    pub fn data(&self) -> DailyForecastData {
        DailyForecastData {
            condition: self.condition.clone(),
            feel_temperature_max: self.feel_temperature_max,
            feel_temperature_min: self.feel_temperature_min,
            humidity_max: self.humidity_max,
            humidity_min: self.humidity_min,
            precipitation_probability: self.precipitation_probability,
            temperature_max: self.temperature_max,
            temperature_min: self.temperature_min,
            timestamps: Timestamps::new(&self.datetime),
            uv_index: self.uv_index,
            wind_direction: self.wind_direction,
            wind_speed: self.wind_speed,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    pub(crate) fn day_record(date: &str, sky: &str) -> Value {
        json!({
            "probPrecipitacion": [
                { "value": 20, "periodo": "00-24" },
                { "value": 10, "periodo": "00-12" },
                { "value": 15, "periodo": "12-24" }
            ],
            "estadoCielo": [
                { "value": sky, "periodo": "00-24", "descripcion": "" },
                { "value": "12", "periodo": "00-12", "descripcion": "" },
                { "value": "14n", "periodo": "12-24", "descripcion": "" }
            ],
            "viento": [
                { "direccion": "NE", "velocidad": 10, "periodo": "00-24" },
                { "direccion": "C", "velocidad": 0, "periodo": "00-12" }
            ],
            "temperatura": { "maxima": 24, "minima": 12, "dato": [] },
            "sensTermica": { "maxima": 23, "minima": 11, "dato": [] },
            "humedadRelativa": { "maxima": 90, "minima": 40, "dato": [] },
            "uvMax": 6,
            "fecha": date
        })
    }

    fn madrid_midnight() -> DateTime<Tz> {
        Tz::Europe__Madrid.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn builds_full_day_value() {
        let record = day_record("2024-07-01T00:00:00", "11");
        let value = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight()).unwrap();

        assert_eq!(value.condition.as_str(), "sunny");
        assert_eq!(value.temperature_max, 24);
        assert_eq!(value.temperature_min, 12);
        assert_eq!(value.feel_temperature_max, 23);
        assert_eq!(value.humidity_min, 40);
        assert_eq!(value.precipitation_probability, 20);
        assert_eq!(value.uv_index, Some(6));
        assert_eq!(value.wind_direction, Some(45.0));
        assert_eq!(value.wind_speed, Some(10.0));
    }

    #[test]
    fn empty_full_day_condition_falls_back_to_second_half() {
        let record = day_record("2024-07-01T00:00:00", "");
        let value = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight()).unwrap();
        assert_eq!(value.condition.as_str(), "cloudy");
    }

    #[test]
    fn missing_condition_rejects_the_day() {
        let mut record = day_record("2024-07-01T00:00:00", "11");
        record["estadoCielo"] = json!([{ "value": "", "periodo": "00-24" }]);
        let result = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight());
        assert!(matches!(result, Err(ForecastError::MissingCondition(_))));
    }

    #[test]
    fn calm_wind_carries_no_speed() {
        let mut record = day_record("2024-07-01T00:00:00", "11");
        record["viento"] = json!([{ "direccion": "C", "velocidad": 15, "periodo": "00-24" }]);
        let value = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight()).unwrap();
        assert_eq!(value.wind_direction, None);
        assert_eq!(value.wind_speed, None);
    }

    #[test]
    fn uv_index_is_optional() {
        let mut record = day_record("2024-07-01T00:00:00", "11");
        record.as_object_mut().unwrap().remove("uvMax");
        let value = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight()).unwrap();
        assert_eq!(value.uv_index, None);
    }

    #[test]
    fn missing_temperature_is_reported() {
        let mut record = day_record("2024-07-01T00:00:00", "11");
        record.as_object_mut().unwrap().remove("temperatura");
        let result = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight());
        assert!(matches!(result, Err(ForecastError::MissingAttribute(_))));
    }

    #[test]
    fn data_view_uses_kebab_case_keys() {
        let record = day_record("2024-07-01T00:00:00", "11n");
        let value = DailyForecastValue::new(record.as_object().unwrap(), madrid_midnight()).unwrap();
        let data = serde_json::to_value(value.data()).unwrap();

        assert_eq!(data["condition"], "clear-night");
        assert_eq!(data["feel-temperature-max"], 23);
        assert_eq!(data["timestamp-local"], "2024-07-01T00:00:00+02:00");
        assert_eq!(data["timestamp-utc"], "2024-06-30T22:00:00+00:00");
        assert_eq!(data["uv-index"], 6);
    }
}
