//! Configuration module for the composer.
//!
//! Handles writer and builder settings loaded from TOML.

mod settings;

pub use settings::{BuilderSettings, Settings, SettingsError, WriterSettings};
