pub mod config;
pub mod core;
pub mod preferences;
pub mod teachers;
