//! Everything between a registry snapshot and the outside world.
//!
//! - `filter`: drop excluded metric names and dimension pairs.
//! - `sink`: where filtered batches go.
//! - `scheduler`: the single task that drives collect -> filter -> sink.

pub mod filter;
pub mod scheduler;
pub mod sink;

pub use filter::ExclusionFilter;
pub use scheduler::{internal_datapoints, CollectScheduler, INTERNAL_SOURCE};
pub use sink::{ChannelSink, LogSink, Sink, SinkError};
