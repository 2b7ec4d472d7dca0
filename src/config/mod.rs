//! Configuration module for grimoire
//!
//! This module handles user preferences for the editing engine,
//! including serialization/deserialization to/from JSON and
//! persistent storage to platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
