//! # jemboo-settings
//!
//! Layered configuration for the Jemboo gateway.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`JembooSettings::default()`]
//! 2. **User file**: `~/.jemboo/settings.json` or an explicit path (deep-merged over defaults)
//! 3. **Environment variables**: `JEMBOO_*` overrides (highest priority)
//!
//! The binary applies its CLI flags on top of the result.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
