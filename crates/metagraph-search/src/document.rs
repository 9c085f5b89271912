//! Partial search documents
//!
//! Every field except `urn` is optional and left out of the serialized form
//! when unset, so a document doubles as a patch: the sink only overwrites the
//! fields a patch actually carries.

use metagraph_core::urn::{DATA_FLOW_TYPE, DATA_JOB_TYPE};
use metagraph_core::Urn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataJobDocument {
    pub urn: Urn,

    /// Flow id of the owning data flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_flow: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_paths: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    /// Usernames of user owners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

impl DataJobDocument {
    /// Patch carrying only the urn
    pub fn new(urn: Urn) -> Self {
        Self {
            urn,
            data_flow: None,
            job_id: None,
            browse_paths: None,
            name: None,
            description: None,
            job_type: None,
            owners: None,
            removed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowDocument {
    pub urn: Urn,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_paths: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

impl DataFlowDocument {
    /// Patch carrying only the urn
    pub fn new(urn: Urn) -> Self {
        Self {
            urn,
            orchestrator: None,
            flow_id: None,
            cluster: None,
            browse_paths: None,
            name: None,
            description: None,
            project: None,
            owners: None,
            removed: None,
        }
    }
}

/// Document patch of any supported entity type
///
/// Write-only: the body carries no type tag, so the entity type travels
/// beside it in `SearchPayload::document_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocumentPatch {
    DataJob(DataJobDocument),
    DataFlow(DataFlowDocument),
}

impl DocumentPatch {
    pub fn urn(&self) -> &Urn {
        match self {
            Self::DataJob(d) => &d.urn,
            Self::DataFlow(d) => &d.urn,
        }
    }

    pub fn document_type(&self) -> &'static str {
        match self {
            Self::DataJob(_) => DATA_JOB_TYPE,
            Self::DataFlow(_) => DATA_FLOW_TYPE,
        }
    }
}

impl From<DataJobDocument> for DocumentPatch {
    fn from(d: DataJobDocument) -> Self {
        Self::DataJob(d)
    }
}

impl From<DataFlowDocument> for DocumentPatch {
    fn from(d: DataFlowDocument) -> Self {
        Self::DataFlow(d)
    }
}
