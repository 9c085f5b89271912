//! Aspect types - independently versioned facets of an entity

use crate::urn::Urn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Discriminator for the aspect variants the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AspectKind {
    Ownership,
    Status,
    DataJobInfo,
    DataJobInputOutput,
    DataFlowInfo,
}

impl AspectKind {
    /// Name used as the aspect's key in snapshot JSON
    pub fn name(self) -> &'static str {
        match self {
            Self::Ownership => "ownership",
            Self::Status => "status",
            Self::DataJobInfo => "dataJobInfo",
            Self::DataJobInputOutput => "dataJobInputOutput",
            Self::DataFlowInfo => "dataFlowInfo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ownership" => Some(Self::Ownership),
            "status" => Some(Self::Status),
            "dataJobInfo" => Some(Self::DataJobInfo),
            "dataJobInputOutput" => Some(Self::DataJobInputOutput),
            "dataFlowInfo" => Some(Self::DataFlowInfo),
            _ => None,
        }
    }
}

impl std::fmt::Display for AspectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A closed, per-entity-type sum of aspects
///
/// `kind` is `None` for aspects the pipeline does not recognise; those are
/// carried through untouched and ignored by every registry.
pub trait AspectUnion {
    fn kind(&self) -> Option<AspectKind>;

    fn name(&self) -> &str;
}

/// Borrow a concrete aspect out of an aspect union
pub trait AspectRef<T> {
    fn aspect_ref(&self) -> Option<&T>;
}

/// Wire form of a single aspect: a JSON object with exactly one key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAspect(pub serde_json::Map<String, serde_json::Value>);

impl RawAspect {
    pub fn into_single(self) -> Result<(String, serde_json::Value), String> {
        if self.0.len() != 1 {
            return Err(format!(
                "aspect must be an object with exactly one key, found {}",
                self.0.len()
            ));
        }
        self.0
            .into_iter()
            .next()
            .ok_or_else(|| "aspect object is empty".to_string())
    }
}

/// Decode the value of a named aspect
pub fn decode_aspect<T: DeserializeOwned>(
    name: &str,
    value: serde_json::Value,
) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid '{}' aspect: {}", name, e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared aspects
// ─────────────────────────────────────────────────────────────────────────────

/// Role an owner plays for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OwnershipType {
    Developer,
    DataOwner,
    Delegate,
    Producer,
    Consumer,
    Stakeholder,
}

impl OwnershipType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Developer => "DEVELOPER",
            Self::DataOwner => "DATAOWNER",
            Self::Delegate => "DELEGATE",
            Self::Producer => "PRODUCER",
            Self::Consumer => "CONSUMER",
            Self::Stakeholder => "STAKEHOLDER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub owner: Urn,

    #[serde(rename = "type")]
    pub owner_type: OwnershipType,
}

impl Owner {
    pub fn new(owner: Urn, owner_type: OwnershipType) -> Self {
        Self { owner, owner_type }
    }
}

/// Who owns an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    #[serde(default)]
    pub owners: Vec<Owner>,
}

impl Ownership {
    pub fn new(owners: Vec<Owner>) -> Self {
        Self { owners }
    }
}

/// Soft-delete marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub removed: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Data job aspects
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataJobInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, String>,
}

impl DataJobInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }
}

/// Datasets a job reads and writes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataJobInputOutput {
    #[serde(default)]
    pub input_datasets: Vec<Urn>,

    #[serde(default)]
    pub output_datasets: Vec<Urn>,
}

impl DataJobInputOutput {
    pub fn new(input_datasets: Vec<Urn>, output_datasets: Vec<Urn>) -> Self {
        Self {
            input_datasets,
            output_datasets,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Data flow aspects
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl DataFlowInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}
