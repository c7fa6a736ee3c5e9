pub mod config;
pub mod drill;
