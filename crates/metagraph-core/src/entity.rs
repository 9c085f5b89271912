//! Canonical entity records derived from snapshots

use crate::urn::{DataFlowUrn, DataJobUrn, Urn, DATA_FLOW_TYPE, DATA_JOB_TYPE};
use serde::{Deserialize, Serialize};

/// Flattened data job identity plus liveness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataJobEntity {
    pub urn: Urn,

    /// Urn of the owning data flow
    pub flow: Urn,

    pub job_id: String,

    #[serde(default)]
    pub removed: bool,
}

impl DataJobEntity {
    pub fn from_urn(urn: &DataJobUrn) -> Self {
        Self {
            urn: urn.as_urn().clone(),
            flow: urn.flow.as_urn().clone(),
            job_id: urn.job_id.clone(),
            removed: false,
        }
    }

    pub fn with_removed(mut self, removed: bool) -> Self {
        self.removed = removed;
        self
    }
}

/// Flattened data flow identity plus liveness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowEntity {
    pub urn: Urn,
    pub orchestrator: String,
    pub flow_id: String,
    pub cluster: String,

    #[serde(default)]
    pub removed: bool,
}

impl DataFlowEntity {
    pub fn from_urn(urn: &DataFlowUrn) -> Self {
        Self {
            urn: urn.as_urn().clone(),
            orchestrator: urn.orchestrator.clone(),
            flow_id: urn.flow_id.clone(),
            cluster: urn.cluster.clone(),
            removed: false,
        }
    }

    pub fn with_removed(mut self, removed: bool) -> Self {
        self.removed = removed;
        self
    }
}

/// Entity record of any supported type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRecord {
    DataJob(DataJobEntity),
    DataFlow(DataFlowEntity),
}

impl EntityRecord {
    pub fn urn(&self) -> &Urn {
        match self {
            Self::DataJob(e) => &e.urn,
            Self::DataFlow(e) => &e.urn,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::DataJob(_) => DATA_JOB_TYPE,
            Self::DataFlow(_) => DATA_FLOW_TYPE,
        }
    }

    pub fn is_removed(&self) -> bool {
        match self {
            Self::DataJob(e) => e.removed,
            Self::DataFlow(e) => e.removed,
        }
    }
}

impl From<DataJobEntity> for EntityRecord {
    fn from(e: DataJobEntity) -> Self {
        Self::DataJob(e)
    }
}

impl From<DataFlowEntity> for EntityRecord {
    fn from(e: DataFlowEntity) -> Self {
        Self::DataFlow(e)
    }
}
