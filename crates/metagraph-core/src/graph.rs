//! Graph builder - dispatches a snapshot's aspects to relationship builders

use crate::aspect::{AspectKind, AspectUnion};
use crate::entity::EntityRecord;
use crate::error::{DerivationResult, Result, ValidationError};
use crate::relation::RelationshipUpdate;
use crate::snapshot::Snapshot;
use crate::urn::Urn;
use serde::Serialize;

/// Pure function deriving relationship updates from one aspect
pub type RelationshipFn<A> = fn(&Urn, &A) -> DerivationResult<Vec<RelationshipUpdate>>;

/// Pure function building the canonical entity record for a snapshot
pub type EntityFn<A> = fn(&Snapshot<A>) -> std::result::Result<EntityRecord, ValidationError>;

/// One registry entry: the aspect kind a builder accepts and the builder
#[derive(Debug)]
pub struct RelationshipBuilder<A> {
    pub name: &'static str,
    pub aspect: AspectKind,
    pub build: RelationshipFn<A>,
}

impl<A> RelationshipBuilder<A> {
    pub const fn new(name: &'static str, aspect: AspectKind, build: RelationshipFn<A>) -> Self {
        Self {
            name,
            aspect,
            build,
        }
    }
}

/// Everything the graph side derives from one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUpdate {
    pub entities: Vec<EntityRecord>,
    pub relationship_updates: Vec<RelationshipUpdate>,
}

/// Per-entity-type graph builder
///
/// Holds an entity-construction function and a static, ordered table of
/// relationship builders. Processing is pure: the same snapshot always yields
/// the same `GraphUpdate`, so builders can be shared freely across threads.
#[derive(Debug)]
pub struct GraphBuilder<A: 'static> {
    entity_type: &'static str,
    build_entity: EntityFn<A>,
    relationship_builders: &'static [RelationshipBuilder<A>],
}

impl<A: AspectUnion + 'static> GraphBuilder<A> {
    pub const fn new(
        entity_type: &'static str,
        build_entity: EntityFn<A>,
        relationship_builders: &'static [RelationshipBuilder<A>],
    ) -> Self {
        Self {
            entity_type,
            build_entity,
            relationship_builders,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        self.entity_type
    }

    pub fn relationship_builders(&self) -> &'static [RelationshipBuilder<A>] {
        self.relationship_builders
    }

    /// Derive the entity record and relationship updates for a snapshot
    ///
    /// Updates are ordered by the snapshot's aspect order, then by builder
    /// registration order. Aspects with no registered builder contribute
    /// nothing. The first builder failure aborts the whole snapshot.
    pub fn process(&self, snapshot: &Snapshot<A>) -> Result<GraphUpdate> {
        snapshot.validate(self.entity_type)?;
        let entity = (self.build_entity)(snapshot)?;

        let mut relationship_updates = Vec::new();
        for aspect in &snapshot.aspects {
            let Some(kind) = aspect.kind() else {
                tracing::trace!(
                    urn = %snapshot.urn,
                    aspect = aspect.name(),
                    "Skipping unrecognised aspect"
                );
                continue;
            };

            for builder in self.relationship_builders.iter().filter(|b| b.aspect == kind) {
                let updates = (builder.build)(&snapshot.urn, aspect).map_err(|e| {
                    tracing::warn!(
                        urn = %snapshot.urn,
                        aspect = %kind,
                        builder = builder.name,
                        "Relationship builder failed: {}",
                        e.message
                    );
                    e
                })?;
                relationship_updates.extend(updates);
            }
        }

        tracing::debug!(
            urn = %snapshot.urn,
            aspects = snapshot.aspects.len(),
            updates = relationship_updates.len(),
            "Built graph update"
        );

        Ok(GraphUpdate {
            entities: vec![entity],
            relationship_updates,
        })
    }
}
