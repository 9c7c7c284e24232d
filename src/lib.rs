//! Sanctions Graph: loads extracted sanctions-list records into a
//! deduplicated property graph.
//!
//! Pipeline: `records` decodes raw JSON, `mapper` turns one record into an
//! `UpsertPlan`, `writer` applies the plan to a `store::GraphStore` one
//! transaction scope at a time, and `ingest` runs batches concurrently and
//! reports per-record outcomes.

pub mod alias;
pub mod bootstrap;
pub mod core;
pub mod ingest;
pub mod mapper;
pub mod records;
pub mod reference;
pub mod store;
pub mod writer;

pub use crate::core::{config, error};
