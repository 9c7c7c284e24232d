//! Public configuration types consumed by the loader pipeline.

use std::path::PathBuf;

use crate::records::{ListDescriptor, RegimeDescriptor};

/// Graph store settings (from `[store]`).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file (already expanded, no `~`).
    pub path: PathBuf,
    /// Upper bound on how long one transaction waits for the write lock.
    pub tx_timeout_ms: u64,
    /// Attempts per transaction before the scope is reported as failed.
    pub retry_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

/// Batch ingestion settings (from `[ingest]`).
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum records processed concurrently. Always at least 1.
    pub workers: usize,
    /// Extracted individuals JSON, if any.
    pub individuals: Option<PathBuf>,
    /// Extracted organisations JSON, if any.
    pub entities: Option<PathBuf>,
}

/// Fully-resolved loader configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Append log output to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub regime: RegimeDescriptor,
    pub list: ListDescriptor,
}
