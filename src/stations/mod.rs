pub mod error;
pub mod registry;
pub mod selector;
pub mod station_index;
