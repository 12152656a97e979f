//! drainpipe collector library entry.
//!
//! Wires the HTTP drain transport, the metric registry, the dispatch pipeline
//! and the operational endpoints together. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod registry;
pub mod router;
pub mod transport;
