use crate::forecast::error::ForecastError;
use chrono::{
    DateTime, DurationRound, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;

/// `now` floored to the top of the hour.
pub fn current_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(TimeDelta::hours(1)).unwrap_or(now)
}

/// `now` floored to the top of the hour and expressed in `tz`.
pub fn current_datetime(tz: Tz, now: DateTime<Utc>) -> DateTime<Tz> {
    current_hour(now).with_timezone(&tz)
}

/// Parses a provider timestamp. Naive values (`2024-03-05T10:00:00`) are UTC;
/// offset-carrying values are converted to UTC.
pub fn parse_api_timestamp(timestamp: &str) -> Result<DateTime<Utc>, ForecastError> {
    let timestamp = timestamp.trim();
    match timestamp.parse::<NaiveDateTime>() {
        Ok(naive) => Ok(naive.and_utc()),
        Err(naive_err) => DateTime::parse_from_rfc3339(timestamp)
            .or_else(|_| DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%z"))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ForecastError::InvalidTimestamp {
                value: timestamp.to_string(),
                source: naive_err,
            }),
    }
}

/// Parses a forecast day (`2024-03-05T00:00:00` or `2024-03-05`) into the
/// calendar date it names; any time part is ignored.
pub fn parse_forecast_date(value: &str) -> Result<NaiveDate, ForecastError> {
    let value = value.trim();
    let date_part = value.split_once('T').map_or(value, |(date, _)| date);
    date_part
        .parse::<NaiveDate>()
        .map_err(|source| ForecastError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

/// Resolves a wall-clock time in `tz`. Ambiguous times (DST fall-back) take the
/// earlier instant; times inside a DST gap do not exist.
pub fn local_datetime(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, ForecastError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(ForecastError::NonexistentLocalTime {
            datetime: naive,
            timezone: tz,
        }),
    }
}
