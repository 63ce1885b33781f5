pub use homekeep_cli::cli;
pub use homekeep_cli::commands;
pub use homekeep_cli::config;
pub use homekeep_cli::logging;
pub use homekeep_cli::AppConfig;

pub use homekeep_core as core;
pub use homekeep_core::database as db;
pub use homekeep_core::model;
pub use homekeep_core::services;
pub use homekeep_core::AppState;
