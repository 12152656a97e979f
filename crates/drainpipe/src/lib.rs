//! Top-level facade crate for drainpipe.
//!
//! Re-exports core types and the collector library so users can depend on a single crate.

pub mod core {
    pub use drainpipe_core::*;
}

pub mod collector {
    pub use drainpipe_collector::*;
}
