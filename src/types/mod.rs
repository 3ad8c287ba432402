pub mod coordinates;
pub mod series;
pub mod station;
pub mod time_range;
pub mod traits;
