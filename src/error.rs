use crate::forecast::error::ForecastError;
use crate::stations::error::LocateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AemetError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("No town selected, call select_coordinates first")]
    NoTownSelected,
}
