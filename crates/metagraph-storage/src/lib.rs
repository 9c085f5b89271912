//! Metagraph Storage - Graph sinks for derived relationship updates
//!
//! This crate defines the graph sink contract the pipeline publishes to and
//! an in-memory implementation that honours every removal policy.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryGraphSink;
pub use traits::{GraphSink, StoredGraph};
