//! Metagraph Core - Entity model and graph projection
//!
//! This crate provides the urn and snapshot model, the aspect unions, and the
//! relationship and graph builders that turn a snapshot into graph updates.

pub mod aspect;
pub mod builders;
pub mod entity;
pub mod error;
pub mod graph;
pub mod limits;
pub mod registry;
pub mod relation;
pub mod snapshot;
pub mod urn;

pub use aspect::{
    AspectKind, AspectRef, AspectUnion, DataFlowInfo, DataJobInfo, DataJobInputOutput, Owner,
    Ownership, OwnershipType, Status,
};
pub use entity::{DataFlowEntity, DataJobEntity, EntityRecord};
pub use error::{DerivationError, Error, Result, ValidationError};
pub use graph::{GraphBuilder, GraphUpdate, RelationshipBuilder};
pub use registry::GraphRegistry;
pub use relation::{Edge, RelationshipType, RelationshipUpdate, RemovalOption};
pub use snapshot::{
    DataFlowAspect, DataFlowSnapshot, DataJobAspect, DataJobSnapshot, EntitySnapshot, Snapshot,
};
pub use urn::{DataFlowUrn, DataJobUrn, Urn, UrnComponent};
