//! Metagraph Search - Search-side projection of entity snapshots
//!
//! Builds partial search documents from snapshots, turns them into
//! serialized payloads, and provides the search sink they are published to.

pub mod adapter;
pub mod dataflow;
pub mod datajob;
pub mod document;
pub mod error;
pub mod index;
pub mod memory;
pub mod traits;

pub use adapter::{to_payload, IndexRecord, SearchPayload};
pub use document::{DataFlowDocument, DataJobDocument, DocumentPatch};
pub use error::{SearchError, SearchResult};
pub use index::{DocumentBuilder, IndexBuilder, IndexRegistry};
pub use memory::MemorySearchSink;
pub use traits::SearchSink;
