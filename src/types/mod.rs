pub mod coordinates;
pub mod period;
pub mod raw;
pub mod station;
pub mod town;
pub mod units;
pub mod weather_condition;
