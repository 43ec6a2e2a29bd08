use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("No station found within {max_distance_km} km of [{latitude}, {longitude}]")]
    StationNotFound {
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    },

    #[error("No town found within {max_distance_km} km of [{latitude}, {longitude}]")]
    TownNotFound {
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    },

    #[error("{kind} record has no valid '{field}'")]
    InvalidRecord {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Invalid sexagesimal coordinate '{0}'")]
    InvalidCoordinate(String),
}
