//! In-memory graph sink

use crate::error::{StorageError, StorageResult};
use crate::traits::GraphSink;
use async_trait::async_trait;
use metagraph_core::{Edge, EntityRecord, RelationshipType, RemovalOption, Urn};
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

/// An edge plus the urn of the entity whose update wrote it
struct StoredEdge {
    producer: Urn,
    edge: Edge,
}

#[derive(Default)]
struct GraphState {
    entities: BTreeMap<Urn, EntityRecord>,
    edges: Vec<StoredEdge>,
}

impl GraphState {
    /// Insert an edge for `producer`, replacing the properties of an edge the
    /// same producer already wrote with the same (type, source, destination)
    fn insert_edge(&mut self, producer: &Urn, edge: &Edge) {
        match self
            .edges
            .iter_mut()
            .find(|s| s.producer == *producer && s.edge.key() == edge.key())
        {
            Some(existing) => existing.edge.properties = edge.properties.clone(),
            None => self.edges.push(StoredEdge {
                producer: producer.clone(),
                edge: edge.clone(),
            }),
        }
    }

    /// Distinct edges in insertion order
    ///
    /// Several producers may write the same edge; it is reported once.
    fn distinct_edges(&self, keep: impl Fn(&Edge) -> bool) -> Vec<Edge> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .map(|s| &s.edge)
            .filter(|e| keep(*e) && seen.insert(e.key()))
            .cloned()
            .collect()
    }
}

/// In-memory graph sink
///
/// Useful for testing and for the `replay` command. Entities and edges live
/// behind a single lock so every update is applied atomically. Each stored
/// edge remembers the entity whose update wrote it, so a replace-all update
/// also clears edges that start elsewhere (e.g. `DownstreamOf` edges between
/// datasets written on behalf of a job).
pub struct MemoryGraphSink {
    state: RwLock<GraphState>,
}

impl MemoryGraphSink {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
        }
    }
}

impl Default for MemoryGraphSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphSink for MemoryGraphSink {
    // Entity operations

    async fn upsert_entity(&self, entity: &EntityRecord) -> StorageResult<()> {
        let mut state = self.state.write().map_err(StorageError::lock)?;
        state.entities.insert(entity.urn().clone(), entity.clone());
        Ok(())
    }

    async fn get_entity(&self, urn: &Urn) -> StorageResult<Option<EntityRecord>> {
        let state = self.state.read().map_err(StorageError::lock)?;
        Ok(state.entities.get(urn).cloned())
    }

    async fn get_all_entities(&self) -> StorageResult<Vec<EntityRecord>> {
        let state = self.state.read().map_err(StorageError::lock)?;
        Ok(state.entities.values().cloned().collect())
    }

    // Relationship operations

    async fn apply_relationship_update(
        &self,
        source: &Urn,
        relationship_type: RelationshipType,
        edges: &[Edge],
        removal: RemovalOption,
    ) -> StorageResult<()> {
        if let Some(edge) = edges
            .iter()
            .find(|e| e.relationship_type != relationship_type)
        {
            return Err(StorageError::MixedEdgeType {
                source_urn: source.to_string(),
                expected: relationship_type.to_string(),
                found: edge.relationship_type.to_string(),
            });
        }

        let mut state = self.state.write().map_err(StorageError::lock)?;
        let before = state.edges.len();

        match removal {
            RemovalOption::RemoveNone => {}
            RemovalOption::RemoveAllEdgesFromSource => {
                state.edges.retain(|s| {
                    !(s.edge.relationship_type == relationship_type
                        && (s.producer == *source || s.edge.source == *source))
                });
            }
            RemovalOption::RemoveAllEdgesFromSourceToDestination => {
                let pairs: HashSet<(&Urn, &Urn)> =
                    edges.iter().map(|e| (&e.source, &e.destination)).collect();
                state.edges.retain(|s| {
                    !(s.edge.relationship_type == relationship_type
                        && pairs.contains(&(&s.edge.source, &s.edge.destination)))
                });
            }
        }
        let removed = before - state.edges.len();

        for edge in edges {
            state.insert_edge(source, edge);
        }

        tracing::debug!(
            source = %source,
            relationship = %relationship_type,
            removed,
            inserted = edges.len(),
            "Applied relationship update"
        );
        Ok(())
    }

    async fn get_edges_from(
        &self,
        source: &Urn,
        relationship_type: Option<RelationshipType>,
    ) -> StorageResult<Vec<Edge>> {
        let state = self.state.read().map_err(StorageError::lock)?;
        Ok(state.distinct_edges(|e| {
            e.source == *source && relationship_type.map_or(true, |t| e.relationship_type == t)
        }))
    }

    async fn get_edges_to(
        &self,
        destination: &Urn,
        relationship_type: Option<RelationshipType>,
    ) -> StorageResult<Vec<Edge>> {
        let state = self.state.read().map_err(StorageError::lock)?;
        Ok(state.distinct_edges(|e| {
            e.destination == *destination
                && relationship_type.map_or(true, |t| e.relationship_type == t)
        }))
    }

    async fn get_all_edges(&self) -> StorageResult<Vec<Edge>> {
        let state = self.state.read().map_err(StorageError::lock)?;
        Ok(state.distinct_edges(|_| true))
    }
}
