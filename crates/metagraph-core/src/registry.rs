//! Per-entity-type graph registries

use crate::aspect::{AspectKind, Status};
use crate::builders::{
    consumes_from_input_output, downstream_of_from_input_output, owned_by_from_ownership,
    produces_from_input_output, CONSUMES_FROM_INPUT_OUTPUT, DOWNSTREAM_OF_FROM_INPUT_OUTPUT,
    OWNED_BY_FROM_OWNERSHIP, PRODUCES_FROM_INPUT_OUTPUT,
};
use crate::entity::{DataFlowEntity, DataJobEntity, EntityRecord};
use crate::error::{Result, ValidationError};
use crate::graph::{GraphBuilder, GraphUpdate, RelationshipBuilder};
use crate::snapshot::{
    DataFlowAspect, DataFlowSnapshot, DataJobAspect, DataJobSnapshot, EntitySnapshot,
};
use crate::urn::{DataFlowUrn, DataJobUrn, DATA_FLOW_TYPE, DATA_JOB_TYPE};

pub static DATA_JOB_RELATIONSHIP_BUILDERS: &[RelationshipBuilder<DataJobAspect>] = &[
    RelationshipBuilder::new(
        OWNED_BY_FROM_OWNERSHIP,
        AspectKind::Ownership,
        owned_by_from_ownership::<DataJobAspect>,
    ),
    RelationshipBuilder::new(
        CONSUMES_FROM_INPUT_OUTPUT,
        AspectKind::DataJobInputOutput,
        consumes_from_input_output::<DataJobAspect>,
    ),
    RelationshipBuilder::new(
        DOWNSTREAM_OF_FROM_INPUT_OUTPUT,
        AspectKind::DataJobInputOutput,
        downstream_of_from_input_output::<DataJobAspect>,
    ),
    RelationshipBuilder::new(
        PRODUCES_FROM_INPUT_OUTPUT,
        AspectKind::DataJobInputOutput,
        produces_from_input_output::<DataJobAspect>,
    ),
];

pub static DATA_FLOW_RELATIONSHIP_BUILDERS: &[RelationshipBuilder<DataFlowAspect>] =
    &[RelationshipBuilder::new(
        OWNED_BY_FROM_OWNERSHIP,
        AspectKind::Ownership,
        owned_by_from_ownership::<DataFlowAspect>,
    )];

fn build_data_job_entity(
    snapshot: &DataJobSnapshot,
) -> std::result::Result<EntityRecord, ValidationError> {
    let urn = DataJobUrn::try_from(&snapshot.urn)?;
    let removed = snapshot.aspect::<Status>().is_some_and(|s| s.removed);
    Ok(DataJobEntity::from_urn(&urn).with_removed(removed).into())
}

fn build_data_flow_entity(
    snapshot: &DataFlowSnapshot,
) -> std::result::Result<EntityRecord, ValidationError> {
    let urn = DataFlowUrn::try_from(&snapshot.urn)?;
    let removed = snapshot.aspect::<Status>().is_some_and(|s| s.removed);
    Ok(DataFlowEntity::from_urn(&urn).with_removed(removed).into())
}

pub static DATA_JOB_GRAPH_BUILDER: GraphBuilder<DataJobAspect> = GraphBuilder::new(
    DATA_JOB_TYPE,
    build_data_job_entity,
    DATA_JOB_RELATIONSHIP_BUILDERS,
);

pub static DATA_FLOW_GRAPH_BUILDER: GraphBuilder<DataFlowAspect> = GraphBuilder::new(
    DATA_FLOW_TYPE,
    build_data_flow_entity,
    DATA_FLOW_RELATIONSHIP_BUILDERS,
);

/// Graph builders for every supported entity type
#[derive(Debug, Clone, Copy)]
pub struct GraphRegistry {
    data_job: &'static GraphBuilder<DataJobAspect>,
    data_flow: &'static GraphBuilder<DataFlowAspect>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self {
            data_job: &DATA_JOB_GRAPH_BUILDER,
            data_flow: &DATA_FLOW_GRAPH_BUILDER,
        }
    }

    /// Route a snapshot to the graph builder for its entity type
    pub fn process(&self, snapshot: &EntitySnapshot) -> Result<GraphUpdate> {
        match snapshot {
            EntitySnapshot::DataJob(s) => self.data_job.process(s),
            EntitySnapshot::DataFlow(s) => self.data_flow.process(s),
        }
    }
}

impl Default for GraphRegistry {
    fn default() -> Self {
        Self::new()
    }
}
