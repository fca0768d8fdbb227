//! Shared types for the Config Composer system
//!
//! This crate contains the configuration object model, plugin descriptors,
//! merge strategy types and the error types used across the composer crates.

pub mod error;
pub mod plugin;
pub mod strategy;
pub mod utils;
pub mod value;

// Re-export commonly used types
pub use error::{ComposerError, ConfigError, DocumentError, Result};
pub use plugin::{PluginDescriptor, PLUGIN_KEY};
pub use strategy::ArrayStrategy;
pub use value::{ConfigObject, ConfigValue, ValueKind};
