//! drainpipe core: log-drain line parsing, metric extraction, series identity,
//! and the error surface shared by the collector runtime.
//!
//! This crate carries no HTTP or async runtime dependencies. Everything here is
//! a pure function of its input so the collector, tests, and offline tooling can
//! reuse the same parsing rules.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed drain traffic surfaces as `DrainError`/`Result` or as a dropped
//! line, never as a crashed collector.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod series;

/// Shared result type.
pub use error::{Result, DrainError};
pub use series::{Datapoint, Dimensions, SeriesId};
