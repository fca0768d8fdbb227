//! Configuration management for the Config Composer system
//!
//! This crate handles the composer's own settings, loaded from YAML files and
//! environment variables, and reading and writing the configuration documents
//! that get composed.

pub mod document;
pub mod loader;
pub mod schema;
pub mod validation;

pub use document::*;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validation::*;
