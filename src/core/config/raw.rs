//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub loader: RawLoader,
    #[serde(default)]
    pub store: RawStore,
    #[serde(default)]
    pub ingest: RawIngest,
    #[serde(default)]
    pub regime: RawRegime,
    #[serde(default)]
    pub list: RawList,
}

#[derive(Deserialize)]
pub(super) struct RawLoader {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawLoader {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawStore {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_tx_timeout_ms")]
    pub tx_timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            tx_timeout_ms: default_tx_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

// ── Ingest ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawIngest {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub individuals: Option<String>,
    #[serde(default)]
    pub entities: Option<String>,
}

impl Default for RawIngest {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            individuals: None,
            entities: None,
        }
    }
}

// ── Regime / list descriptors ────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawRegime {
    #[serde(default = "default_regime_id")]
    pub id: String,
    #[serde(default = "default_regime_name")]
    pub name: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_legal_basis")]
    pub legal_basis: String,
}

impl Default for RawRegime {
    fn default() -> Self {
        Self {
            id: default_regime_id(),
            name: default_regime_name(),
            authority: default_authority(),
            legal_basis: default_legal_basis(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawList {
    #[serde(default = "default_list_id")]
    pub id: String,
    #[serde(default = "default_list_name")]
    pub name: String,
    #[serde(default = "default_source_file")]
    pub source_file: String,
    #[serde(default = "default_authority")]
    pub authority: String,
}

impl Default for RawList {
    fn default() -> Self {
        Self {
            id: default_list_id(),
            name: default_list_name(),
            source_file: default_source_file(),
            authority: default_authority(),
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_store_path() -> String { "sanctions.db".to_string() }
pub(super) fn default_tx_timeout_ms() -> u64 { 5_000 }
pub(super) fn default_retry_attempts() -> u32 { 3 }
pub(super) fn default_retry_backoff_ms() -> u64 { 50 }
pub(super) fn default_workers() -> usize { 4 }
pub(super) fn default_regime_id() -> String { "cyber".to_string() }
pub(super) fn default_regime_name() -> String { "Cyber".to_string() }
pub(super) fn default_authority() -> String { "HM Treasury (OFSI)".to_string() }
pub(super) fn default_legal_basis() -> String {
    "The Cyber (Sanctions) (EU Exit) Regulations 2020".to_string()
}
pub(super) fn default_list_id() -> String { "uk-cyber".to_string() }
pub(super) fn default_list_name() -> String { "UK Sanctions List - Cyber Regime".to_string() }
pub(super) fn default_source_file() -> String { "Cyber.pdf".to_string() }
