//! Period parsing and the three lookups used to pick one row out of a forecast
//! attribute table: exact hour, interval containment and whole-day selection.

use crate::forecast::error::ForecastError;
use crate::types::raw::{is_empty_value, value_as_string, RawValue};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const PERIOD_KEY: &str = "periodo";
pub const VALUE_KEY: &str = "value";

pub const PERIOD_FULL_DAY: &str = "00-24";
pub const PERIOD_SECOND_HALF_DAY: &str = "12-24";
pub const PERIOD_LAST_QUARTER_DAY: &str = "18-24";

const PERIOD_SPLIT: usize = 2;
const HOURS_PER_DAY: i32 = 24;

/// A half-open hour window `[start, end)` parsed from a four digit token such as
/// `"0814"`. `end < start` means the window wraps past midnight (`"2002"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: i32,
    pub end: i32,
}

impl Period {
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, hour: i32) -> bool {
        self.start <= hour && hour < self.end
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ForecastError::MalformedPeriod(s.to_string());
        if s.len() != PERIOD_SPLIT * 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let start = s[..PERIOD_SPLIT].parse().map_err(|_| malformed())?;
        let end = s[PERIOD_SPLIT..].parse().map_err(|_| malformed())?;
        Ok(Period { start, end })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.start, self.end)
    }
}

fn row_period(row: &serde_json::Map<String, Value>) -> Result<String, ForecastError> {
    row.get(PERIOD_KEY)
        .and_then(value_as_string)
        .ok_or_else(|| ForecastError::MalformedPeriod(String::new()))
}

fn non_empty(value: &Value) -> Option<&Value> {
    (!is_empty_value(value)).then_some(value)
}

/// Exact-hour lookup for point-valued attributes keyed one row per hour.
///
/// A row matches when its period, read as an integer, equals `hour`. Rows
/// without `key` are skipped. An empty cell on the matching row is absent.
pub fn hour_value<'a>(
    values: &RawValue<'a>,
    hour: u32,
    key: &str,
) -> Result<Option<&'a Value>, ForecastError> {
    for row in values.iter() {
        let Some(value) = row.get(key) else {
            continue;
        };
        let period = row_period(row)?;
        let row_hour: i64 = period
            .trim()
            .parse()
            .map_err(|_| ForecastError::MalformedPeriod(period.clone()))?;
        if row_hour == i64::from(hour) {
            return Ok(non_empty(value));
        }
    }
    Ok(None)
}

/// Interval lookup for attributes bucketed into multi-hour windows.
///
/// The smallest `end` among wrapping rows is taken as an offset and subtracted
/// from every window before testing containment; a window that still wraps
/// gets 24 added to its end, and hour 0 is then read as 24. The shifted `hour`
/// stays shifted for the rest of the scan.
///
/// This re-alignment mirrors how the provider encodes its windows relative to
/// a non-zero day start. It is possibly provider-specific; keep the arithmetic
/// as is.
pub fn interval_value<'a>(
    values: &RawValue<'a>,
    hour: u32,
    key: &str,
) -> Result<Option<&'a Value>, ForecastError> {
    let mut offset: Option<i32> = None;
    for row in values.iter() {
        if !row.contains_key(key) {
            continue;
        }
        let period: Period = row_period(row)?.parse()?;
        if period.wraps() && offset.map_or(true, |o| period.end < o) {
            offset = Some(period.end);
        }
    }
    let offset = offset.unwrap_or(0);

    let mut hour = hour as i32;
    for row in values.iter() {
        let Some(value) = row.get(key) else {
            continue;
        };
        let mut period: Period = row_period(row)?.parse()?;
        period.start -= offset;
        period.end -= offset;
        if period.wraps() {
            period.end += HOURS_PER_DAY;
            if hour == 0 {
                hour += HOURS_PER_DAY;
            }
        }
        if period.contains(hour) {
            return Ok(non_empty(value));
        }
    }
    Ok(None)
}

/// Whole-day lookup: a single row is returned regardless of its period tag,
/// a multi-row table only yields the full-day (`00-24`) row.
pub fn day_value<'a>(values: &RawValue<'a>, key: &str) -> Option<&'a Value> {
    day_value_in(values, key, &[PERIOD_FULL_DAY])
}

/// Whole-day lookup over several period tags: the first non-empty row, in
/// table order, whose tag is one of `periods`.
pub fn day_value_in<'a>(values: &RawValue<'a>, key: &str, periods: &[&str]) -> Option<&'a Value> {
    match values {
        RawValue::Row(row) => row.get(key).and_then(non_empty),
        RawValue::Rows(rows) if rows.len() > 1 => rows.iter().find_map(|row| {
            let value = row.get(key).and_then(non_empty)?;
            let row_period = row.get(PERIOD_KEY).and_then(Value::as_str)?;
            periods.contains(&row_period).then_some(value)
        }),
        RawValue::Rows(rows) => rows
            .first()
            .and_then(|row| row.get(key))
            .and_then(non_empty),
    }
}
