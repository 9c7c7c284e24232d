//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `SANCTIONS_GRAPH_DB` and `SANCTIONS_GRAPH_LOG_LEVEL` env
//! overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::AppError;
use crate::records::{ListDescriptor, RegimeDescriptor};

use super::raw::RawConfig;
use super::types::*;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Deep-merge two TOML values.
/// Tables are merged recursively; the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, the built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let db_override = env::var("SANCTIONS_GRAPH_DB").ok();
    let log_level_override = env::var("SANCTIONS_GRAPH_LOG_LEVEL").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            db_override.as_deref(),
            log_level_override.as_deref(),
        );
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(
            default_path,
            db_override.as_deref(),
            log_level_override.as_deref(),
        )
    } else {
        Ok(resolve(
            RawConfig::default(),
            db_override.as_deref(),
            log_level_override.as_deref(),
        ))
    }
}

/// Internal loader: accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(
    path: &Path,
    db_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val)
        .map_err(|e: toml::de::Error| {
            AppError::Config(format!("config error in {}: {e}", path.display()))
        })?;

    if parsed.regime.id.trim().is_empty() || parsed.list.id.trim().is_empty() {
        return Err(AppError::Config(format!(
            "{}: [regime] id and [list] id must not be empty",
            path.display()
        )));
    }

    Ok(resolve(parsed, db_override, log_level_override))
}

fn resolve(
    parsed: RawConfig,
    db_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Config {
    let store_path = expand_home(db_override.unwrap_or(&parsed.store.path));
    let log_level = log_level_override.unwrap_or(&parsed.loader.log_level).to_string();

    Config {
        log_level,
        log_file: parsed.loader.log_file.as_deref().map(expand_home),
        store: StoreConfig {
            path: store_path,
            tx_timeout_ms: parsed.store.tx_timeout_ms,
            retry_attempts: parsed.store.retry_attempts.max(1),
            retry_backoff_ms: parsed.store.retry_backoff_ms,
        },
        ingest: IngestConfig {
            workers: parsed.ingest.workers.max(1),
            individuals: parsed.ingest.individuals.as_deref().map(expand_home),
            entities: parsed.ingest.entities.as_deref().map(expand_home),
        },
        regime: RegimeDescriptor {
            id: parsed.regime.id,
            name: parsed.regime.name,
            authority: parsed.regime.authority,
            legal_basis: parsed.regime.legal_basis,
        },
        list: ListDescriptor {
            id: parsed.list.id,
            name: parsed.list.name,
            source_file: parsed.list.source_file,
            authority: parsed.list.authority,
        },
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
