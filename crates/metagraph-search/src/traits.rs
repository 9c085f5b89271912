//! Search sink traits

use async_trait::async_trait;

use crate::adapter::SearchPayload;
pub use crate::error::{SearchError, SearchResult as Result};

/// Trait for search stores that accept document patches
#[async_trait]
pub trait SearchSink: Send + Sync {
    /// Merge a payload's top-level fields into the stored document,
    /// creating the document if it does not exist
    async fn upsert_document_patch(&self, payload: &SearchPayload) -> Result<()>;

    /// Get the merged document for an id
    async fn get_document(&self, id: &str) -> Result<Option<SearchPayload>>;

    /// Get all stored documents
    async fn get_all_documents(&self) -> Result<Vec<SearchPayload>>;

    /// Upsert several payloads in order
    async fn upsert_all(&self, payloads: &[SearchPayload]) -> Result<()> {
        for payload in payloads {
            self.upsert_document_patch(payload).await?;
        }
        Ok(())
    }
}
