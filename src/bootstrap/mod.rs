//! Bootstrap layer: modules that run before ingestion starts.
//!
//! - **logger**: tracing-subscriber initialisation.

pub mod logger;
