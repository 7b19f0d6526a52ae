// src/config/mod.rs

//! TOML configuration for `gitqueue`.

pub mod loader;
pub mod model;

pub use loader::{default_config_path, load_and_validate, load_optional};
pub use model::{ConfigFile, GitSection};
