//! Snapshot types - a full materialized view of one entity

use crate::aspect::{
    decode_aspect, AspectKind, AspectRef, AspectUnion, DataFlowInfo, DataJobInfo,
    DataJobInputOutput, Ownership, RawAspect, Status,
};
use crate::limits::{validate_aspect_count, ValidationError};
use crate::urn::{Urn, DATA_FLOW_TYPE, DATA_JOB_TYPE};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;

/// Urn plus the aspects currently known for it, at most one per variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
pub struct Snapshot<A> {
    pub urn: Urn,

    #[serde(default)]
    pub aspects: Vec<A>,
}

impl<A: AspectUnion> Snapshot<A> {
    pub fn new(urn: Urn) -> Self {
        Self {
            urn,
            aspects: Vec::new(),
        }
    }

    pub fn with_aspect(mut self, aspect: impl Into<A>) -> Self {
        self.aspects.push(aspect.into());
        self
    }

    /// Check the structural invariants that must hold before any builder runs
    pub fn validate(&self, entity_type: &str) -> Result<(), ValidationError> {
        self.urn.expect_type(entity_type)?;
        validate_aspect_count(self.aspects.len())?;

        let mut seen = BTreeSet::new();
        for aspect in &self.aspects {
            if !seen.insert(aspect.name()) {
                return Err(ValidationError::DuplicateAspect {
                    urn: self.urn.to_string(),
                    aspect: aspect.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// First aspect of type `T`, if present
    pub fn aspect<T>(&self) -> Option<&T>
    where
        A: AspectRef<T>,
    {
        self.aspects.iter().find_map(|a| a.aspect_ref())
    }
}

fn serialize_single<S: Serializer, T: Serialize + ?Sized>(
    serializer: S,
    name: &str,
    value: &T,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(name, value)?;
    map.end()
}

// ─────────────────────────────────────────────────────────────────────────────
// Data job
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAspect")]
pub enum DataJobAspect {
    Info(DataJobInfo),
    InputOutput(DataJobInputOutput),
    Ownership(Ownership),
    Status(Status),
    Unknown {
        name: String,
        value: serde_json::Value,
    },
}

pub type DataJobSnapshot = Snapshot<DataJobAspect>;

impl AspectUnion for DataJobAspect {
    fn kind(&self) -> Option<AspectKind> {
        match self {
            Self::Info(_) => Some(AspectKind::DataJobInfo),
            Self::InputOutput(_) => Some(AspectKind::DataJobInputOutput),
            Self::Ownership(_) => Some(AspectKind::Ownership),
            Self::Status(_) => Some(AspectKind::Status),
            Self::Unknown { .. } => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Unknown { name, .. } => name,
            known => known.kind().map(AspectKind::name).unwrap_or_default(),
        }
    }
}

impl TryFrom<RawAspect> for DataJobAspect {
    type Error = String;

    fn try_from(raw: RawAspect) -> Result<Self, Self::Error> {
        let (name, value) = raw.into_single()?;
        Ok(match AspectKind::from_name(&name) {
            Some(AspectKind::DataJobInfo) => Self::Info(decode_aspect(&name, value)?),
            Some(AspectKind::DataJobInputOutput) => Self::InputOutput(decode_aspect(&name, value)?),
            Some(AspectKind::Ownership) => Self::Ownership(decode_aspect(&name, value)?),
            Some(AspectKind::Status) => Self::Status(decode_aspect(&name, value)?),
            Some(AspectKind::DataFlowInfo) | None => Self::Unknown { name, value },
        })
    }
}

impl Serialize for DataJobAspect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = self.name();
        match self {
            Self::Info(v) => serialize_single(serializer, name, v),
            Self::InputOutput(v) => serialize_single(serializer, name, v),
            Self::Ownership(v) => serialize_single(serializer, name, v),
            Self::Status(v) => serialize_single(serializer, name, v),
            Self::Unknown { value, .. } => serialize_single(serializer, name, value),
        }
    }
}

impl From<DataJobInfo> for DataJobAspect {
    fn from(v: DataJobInfo) -> Self {
        Self::Info(v)
    }
}

impl From<DataJobInputOutput> for DataJobAspect {
    fn from(v: DataJobInputOutput) -> Self {
        Self::InputOutput(v)
    }
}

impl From<Ownership> for DataJobAspect {
    fn from(v: Ownership) -> Self {
        Self::Ownership(v)
    }
}

impl From<Status> for DataJobAspect {
    fn from(v: Status) -> Self {
        Self::Status(v)
    }
}

impl AspectRef<DataJobInfo> for DataJobAspect {
    fn aspect_ref(&self) -> Option<&DataJobInfo> {
        match self {
            Self::Info(v) => Some(v),
            _ => None,
        }
    }
}

impl AspectRef<DataJobInputOutput> for DataJobAspect {
    fn aspect_ref(&self) -> Option<&DataJobInputOutput> {
        match self {
            Self::InputOutput(v) => Some(v),
            _ => None,
        }
    }
}

impl AspectRef<Ownership> for DataJobAspect {
    fn aspect_ref(&self) -> Option<&Ownership> {
        match self {
            Self::Ownership(v) => Some(v),
            _ => None,
        }
    }
}

impl AspectRef<Status> for DataJobAspect {
    fn aspect_ref(&self) -> Option<&Status> {
        match self {
            Self::Status(v) => Some(v),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Data flow
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawAspect")]
pub enum DataFlowAspect {
    Info(DataFlowInfo),
    Ownership(Ownership),
    Status(Status),
    Unknown {
        name: String,
        value: serde_json::Value,
    },
}

pub type DataFlowSnapshot = Snapshot<DataFlowAspect>;

impl AspectUnion for DataFlowAspect {
    fn kind(&self) -> Option<AspectKind> {
        match self {
            Self::Info(_) => Some(AspectKind::DataFlowInfo),
            Self::Ownership(_) => Some(AspectKind::Ownership),
            Self::Status(_) => Some(AspectKind::Status),
            Self::Unknown { .. } => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Unknown { name, .. } => name,
            known => known.kind().map(AspectKind::name).unwrap_or_default(),
        }
    }
}

impl TryFrom<RawAspect> for DataFlowAspect {
    type Error = String;

    fn try_from(raw: RawAspect) -> Result<Self, Self::Error> {
        let (name, value) = raw.into_single()?;
        Ok(match AspectKind::from_name(&name) {
            Some(AspectKind::DataFlowInfo) => Self::Info(decode_aspect(&name, value)?),
            Some(AspectKind::Ownership) => Self::Ownership(decode_aspect(&name, value)?),
            Some(AspectKind::Status) => Self::Status(decode_aspect(&name, value)?),
            Some(AspectKind::DataJobInfo | AspectKind::DataJobInputOutput) | None => {
                Self::Unknown { name, value }
            }
        })
    }
}

impl Serialize for DataFlowAspect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = self.name();
        match self {
            Self::Info(v) => serialize_single(serializer, name, v),
            Self::Ownership(v) => serialize_single(serializer, name, v),
            Self::Status(v) => serialize_single(serializer, name, v),
            Self::Unknown { value, .. } => serialize_single(serializer, name, value),
        }
    }
}

impl From<DataFlowInfo> for DataFlowAspect {
    fn from(v: DataFlowInfo) -> Self {
        Self::Info(v)
    }
}

impl From<Ownership> for DataFlowAspect {
    fn from(v: Ownership) -> Self {
        Self::Ownership(v)
    }
}

impl From<Status> for DataFlowAspect {
    fn from(v: Status) -> Self {
        Self::Status(v)
    }
}

impl AspectRef<DataFlowInfo> for DataFlowAspect {
    fn aspect_ref(&self) -> Option<&DataFlowInfo> {
        match self {
            Self::Info(v) => Some(v),
            _ => None,
        }
    }
}

impl AspectRef<Ownership> for DataFlowAspect {
    fn aspect_ref(&self) -> Option<&Ownership> {
        match self {
            Self::Ownership(v) => Some(v),
            _ => None,
        }
    }
}

impl AspectRef<Status> for DataFlowAspect {
    fn aspect_ref(&self) -> Option<&Status> {
        match self {
            Self::Status(v) => Some(v),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Any entity
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of any supported entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntitySnapshot {
    #[serde(rename = "dataJobSnapshot")]
    DataJob(DataJobSnapshot),

    #[serde(rename = "dataFlowSnapshot")]
    DataFlow(DataFlowSnapshot),
}

impl EntitySnapshot {
    pub fn urn(&self) -> &Urn {
        match self {
            Self::DataJob(s) => &s.urn,
            Self::DataFlow(s) => &s.urn,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::DataJob(_) => DATA_JOB_TYPE,
            Self::DataFlow(_) => DATA_FLOW_TYPE,
        }
    }
}

impl From<DataJobSnapshot> for EntitySnapshot {
    fn from(s: DataJobSnapshot) -> Self {
        Self::DataJob(s)
    }
}

impl From<DataFlowSnapshot> for EntitySnapshot {
    fn from(s: DataFlowSnapshot) -> Self {
        Self::DataFlow(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_urn() -> Urn {
        "urn:li:dataJob:(urn:li:dataFlow:(airflow,etl_flow,PROD),load_users)"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_snapshot_from_json() {
        let value = json!({
            "dataJobSnapshot": {
                "urn": "urn:li:dataJob:(urn:li:dataFlow:(airflow,etl_flow,PROD),load_users)",
                "aspects": [
                    { "dataJobInfo": { "name": "load users", "type": "SQL" } },
                    { "status": { "removed": false } }
                ]
            }
        });
        let snapshot: EntitySnapshot = serde_json::from_value(value).unwrap();
        let EntitySnapshot::DataJob(job) = snapshot else {
            panic!("expected a data job snapshot");
        };
        assert_eq!(job.urn, job_urn());
        assert_eq!(job.aspects.len(), 2);
        assert_eq!(job.aspect::<DataJobInfo>().unwrap().job_type.as_deref(), Some("SQL"));
    }

    #[test]
    fn test_snapshot_without_aspects_defaults_to_empty() {
        let value = json!({
            "dataFlowSnapshot": { "urn": "urn:li:dataFlow:(airflow,etl_flow,PROD)" }
        });
        let snapshot: EntitySnapshot = serde_json::from_value(value).unwrap();
        let EntitySnapshot::DataFlow(flow) = snapshot else {
            panic!("expected a data flow snapshot");
        };
        assert!(flow.aspects.is_empty());

        let job: DataJobSnapshot = serde_json::from_value(json!({ "urn": job_urn() })).unwrap();
        assert!(job.aspects.is_empty());
    }

    #[test]
    fn test_unknown_aspect_round_trips() {
        let value = json!({ "schemaMetadata": { "fields": [1, 2] } });
        let aspect: DataJobAspect = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(aspect.kind(), None);
        assert_eq!(aspect.name(), "schemaMetadata");
        assert_eq!(serde_json::to_value(&aspect).unwrap(), value);
    }

    #[test]
    fn test_foreign_known_aspect_is_unknown_for_entity() {
        let aspect: DataJobAspect =
            serde_json::from_value(json!({ "dataFlowInfo": { "name": "flow" } })).unwrap();
        assert!(matches!(aspect, DataJobAspect::Unknown { .. }));
    }

    #[test]
    fn test_malformed_known_aspect_fails() {
        let result: Result<DataJobAspect, _> =
            serde_json::from_value(json!({ "dataJobInputOutput": { "inputDatasets": ["nope"] } }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_aspects() {
        let snapshot = DataJobSnapshot::new(job_urn())
            .with_aspect(Status { removed: false })
            .with_aspect(Status { removed: true });
        assert!(matches!(
            snapshot.validate(DATA_JOB_TYPE),
            Err(ValidationError::DuplicateAspect { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_entity_type() {
        let snapshot = DataJobSnapshot::new(job_urn());
        assert!(snapshot.validate(DATA_JOB_TYPE).is_ok());
        assert!(matches!(
            snapshot.validate(DATA_FLOW_TYPE),
            Err(ValidationError::UnexpectedEntityType { .. })
        ));
    }
}
