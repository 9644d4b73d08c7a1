//! Configuration loader and schema types.
//!
//! This module exposes the settings schema that drives the catalog, the
//! playlist defaults and logging, plus helpers to load it from disk.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
