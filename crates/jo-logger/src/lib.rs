//! J1939 odometer logger: library crate for the ingestion runtime.
//!
//! Re-exports all modules so the binaries and `jo-e2e-tests` share the same
//! config, sink and ingestion code.

pub mod config;
pub mod error;
pub mod ingest;
pub mod sink;
