//! Configuration module for logquery.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{expand_env_vars, Settings, SettingsError, TableSettings};
