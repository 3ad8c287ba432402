pub mod alignment;
pub mod error;
pub mod frame;
pub mod provider;
