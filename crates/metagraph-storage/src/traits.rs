//! Graph sink trait definitions

use crate::error::StorageResult;
use async_trait::async_trait;
use metagraph_core::{
    Edge, EntityRecord, RelationshipType, RelationshipUpdate, RemovalOption, Urn,
};
use serde::Serialize;

/// Everything a graph sink currently holds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoredGraph {
    pub entities: Vec<EntityRecord>,
    pub edges: Vec<Edge>,
}

/// Trait for graph store implementations
///
/// A sink applies each relationship update atomically: concurrent readers
/// see either the edges before the update or the edges after it.
#[async_trait]
pub trait GraphSink: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace an entity record keyed by its urn
    async fn upsert_entity(&self, entity: &EntityRecord) -> StorageResult<()>;

    /// Get an entity record by urn
    async fn get_entity(&self, urn: &Urn) -> StorageResult<Option<EntityRecord>>;

    /// Get all entity records
    async fn get_all_entities(&self) -> StorageResult<Vec<EntityRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Relationship Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a homogeneous edge list under the given removal policy
    ///
    /// `source` is the entity the edges were derived from; it scopes
    /// `RemoveAllEdgesFromSource` even when `edges` is empty.
    async fn apply_relationship_update(
        &self,
        source: &Urn,
        relationship_type: RelationshipType,
        edges: &[Edge],
        removal: RemovalOption,
    ) -> StorageResult<()>;

    /// Edges leaving `source`, optionally restricted to one type
    async fn get_edges_from(
        &self,
        source: &Urn,
        relationship_type: Option<RelationshipType>,
    ) -> StorageResult<Vec<Edge>>;

    /// Edges arriving at `destination`, optionally restricted to one type
    async fn get_edges_to(
        &self,
        destination: &Urn,
        relationship_type: Option<RelationshipType>,
    ) -> StorageResult<Vec<Edge>>;

    /// Get all stored edges
    async fn get_all_edges(&self) -> StorageResult<Vec<Edge>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a derived update as one call
    async fn apply(&self, update: &RelationshipUpdate) -> StorageResult<()> {
        self.apply_relationship_update(
            &update.source,
            update.relationship_type,
            update.edges(),
            update.removal_option,
        )
        .await
    }

    /// Load the entire stored graph
    async fn load_graph(&self) -> StorageResult<StoredGraph> {
        let entities = self.get_all_entities().await?;
        let edges = self.get_all_edges().await?;
        Ok(StoredGraph { entities, edges })
    }
}
