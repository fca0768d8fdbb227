//! Configuration composition for bundler builds
//!
//! This crate deep-merges a shared base configuration with environment
//! overrides and provides the built-in override presets.

pub mod merge;
pub mod options;
pub mod presets;

pub use merge::*;
pub use options::*;
pub use presets::*;
