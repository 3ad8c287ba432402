pub mod any_datetime;
pub mod types;
pub(crate) mod utils;
