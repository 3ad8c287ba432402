pub mod bbox;
pub mod distance;
