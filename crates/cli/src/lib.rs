pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use homekeep_core as core;
pub use homekeep_core::AppConfig;
pub use homekeep_core::AppState;
