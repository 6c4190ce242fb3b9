// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] is the serde mapping of `Coderunner.toml`.
//! - [`loader`] reads the file.
//! - [`validate`] turns a [`RawConfigFile`] into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_or_default};
pub use model::{ConfigFile, ConfigSection, LanguageConfig, RawConfigFile};
