use chrono::NaiveDateTime;
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    // Upstream contract violation, never recovered locally
    #[error("Malformed forecast period '{0}'")]
    MalformedPeriod(String),

    #[error("Forecast table is not a JSON object")]
    InvalidTable,

    #[error("Forecast attribute '{0}' is missing")]
    MissingAttribute(String),

    #[error("Forecast attribute '{key}' holds a non-numeric value '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("No sky condition for {0}")]
    MissingCondition(String),

    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Local time {datetime} does not exist in {timezone}")]
    NonexistentLocalTime {
        datetime: NaiveDateTime,
        timezone: Tz,
    },
}

impl ForecastError {
    /// Whether the error only makes one day/hour slot unrepresentable.
    ///
    /// Recoverable errors are logged and the slot is dropped from its series;
    /// anything else aborts the whole series update.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ForecastError::MissingAttribute(_)
            | ForecastError::InvalidNumber { .. }
            | ForecastError::MissingCondition(_)
            | ForecastError::NonexistentLocalTime { .. } => true,
            ForecastError::MalformedPeriod(_)
            | ForecastError::InvalidTable
            | ForecastError::InvalidTimestamp { .. } => false,
        }
    }
}
