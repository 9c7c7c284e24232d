//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `SANCTIONS_GRAPH_DB` and `SANCTIONS_GRAPH_LOG_LEVEL` env
//! overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `StoreConfig`,
//!   `IngestConfig`).
//! - **raw**: Raw TOML deserialization types (`RawConfig`, `RawStore`, …).
//!   These mirror the file shape and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;
