//! Urn (structured entity identifier) types and parsing
//!
//! Textual form is `urn:li:<entityType>:<key>` where `<key>` is either one
//! component or a parenthesised tuple of components. A component is plain
//! text or a nested urn:
//!
//! ```text
//! urn:li:corpuser:alice
//! urn:li:dataJob:(urn:li:dataFlow:(airflow,etl_flow,PROD),load_users)
//! ```

use crate::limits::{
    validate_component_count, validate_urn_depth, validate_urn_len, ValidationError,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

pub const URN_PREFIX: &str = "urn:li:";

pub const CORP_USER_TYPE: &str = "corpuser";
pub const DATASET_TYPE: &str = "dataset";
pub const DATA_PLATFORM_TYPE: &str = "dataPlatform";
pub const DATA_FLOW_TYPE: &str = "dataFlow";
pub const DATA_JOB_TYPE: &str = "dataJob";

/// One element of an urn key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UrnComponent {
    Text(String),
    Urn(Urn),
}

impl From<&str> for UrnComponent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for UrnComponent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Urn> for UrnComponent {
    fn from(urn: Urn) -> Self {
        Self::Urn(urn)
    }
}

impl std::fmt::Display for UrnComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Urn(urn) => write!(f, "{}", urn),
        }
    }
}

/// Structured, immutable entity identifier. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Urn {
    entity_type: String,
    components: Vec<UrnComponent>,
}

impl Urn {
    /// Build an urn from its parts, validating every component
    pub fn new(
        entity_type: impl Into<String>,
        components: Vec<UrnComponent>,
    ) -> Result<Self, ValidationError> {
        let urn = Self {
            entity_type: entity_type.into(),
            components,
        };
        urn.validate()?;
        Ok(urn)
    }

    /// `urn:li:corpuser:<username>`
    pub fn corp_user(username: &str) -> Result<Self, ValidationError> {
        Self::new(CORP_USER_TYPE, vec![username.into()])
    }

    /// `urn:li:dataPlatform:<name>`
    pub fn data_platform(name: &str) -> Result<Self, ValidationError> {
        Self::new(DATA_PLATFORM_TYPE, vec![name.into()])
    }

    /// `urn:li:dataset:(urn:li:dataPlatform:<platform>,<name>,<env>)`
    pub fn dataset(platform: &str, name: &str, env: &str) -> Result<Self, ValidationError> {
        Self::new(
            DATASET_TYPE,
            vec![Self::data_platform(platform)?.into(), name.into(), env.into()],
        )
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn components(&self) -> &[UrnComponent] {
        &self.components
    }

    /// Text component at `index`, if that component is text
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.components.get(index) {
            Some(UrnComponent::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Nested urn component at `index`, if that component is an urn
    pub fn nested(&self, index: usize) -> Option<&Urn> {
        match self.components.get(index) {
            Some(UrnComponent::Urn(urn)) => Some(urn),
            _ => None,
        }
    }

    pub fn is_type(&self, entity_type: &str) -> bool {
        self.entity_type == entity_type
    }

    /// Fail with `UnexpectedEntityType` unless this urn has the given type
    pub fn expect_type(&self, entity_type: &str) -> Result<(), ValidationError> {
        if self.is_type(entity_type) {
            Ok(())
        } else {
            Err(ValidationError::UnexpectedEntityType {
                urn: self.to_string(),
                expected: entity_type.to_string(),
                found: self.entity_type.clone(),
            })
        }
    }

    fn depth(&self) -> usize {
        1 + self
            .components
            .iter()
            .filter_map(|c| match c {
                UrnComponent::Urn(urn) => Some(urn.depth()),
                UrnComponent::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !is_valid_entity_type(&self.entity_type) {
            return Err(ValidationError::invalid_urn(
                self.to_string(),
                format!("invalid entity type '{}'", self.entity_type),
            ));
        }
        if self.components.is_empty() {
            return Err(ValidationError::invalid_urn(self.to_string(), "missing entity key"));
        }
        validate_component_count(self.components.len())?;
        for component in &self.components {
            if let UrnComponent::Text(text) = component {
                if let Some(reason) = text_component_problem(text) {
                    return Err(ValidationError::invalid_urn(self.to_string(), reason));
                }
            }
        }
        validate_urn_depth(self.depth())?;
        validate_urn_len(&self.to_string())
    }
}

fn is_valid_entity_type(entity_type: &str) -> bool {
    !entity_type.is_empty() && entity_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn text_component_problem(text: &str) -> Option<&'static str> {
    if text.is_empty() {
        Some("empty key component")
    } else if text.contains([',', '(', ')']) {
        Some("key component contains a reserved character")
    } else if text.starts_with("urn:") {
        Some("text key component looks like an urn")
    } else {
        None
    }
}

impl std::fmt::Display for Urn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}:", URN_PREFIX, self.entity_type)?;
        match self.components.as_slice() {
            [UrnComponent::Text(text)] => f.write_str(text),
            components => {
                f.write_str("(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", component)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for Urn {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_urn_len(s)?;
        parse_urn(s, 1)
    }
}

fn parse_urn(s: &str, depth: usize) -> Result<Urn, ValidationError> {
    validate_urn_depth(depth)?;
    let rest = s
        .strip_prefix(URN_PREFIX)
        .ok_or_else(|| ValidationError::invalid_urn(s, "missing 'urn:li:' prefix"))?;
    let (entity_type, key) = rest
        .split_once(':')
        .ok_or_else(|| ValidationError::invalid_urn(s, "missing entity key"))?;
    if !is_valid_entity_type(entity_type) {
        return Err(ValidationError::invalid_urn(
            s,
            format!("invalid entity type '{}'", entity_type),
        ));
    }

    let raw_components = match key.strip_prefix('(') {
        Some(inner) => {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| ValidationError::invalid_urn(s, "unterminated key tuple"))?;
            split_top_level(s, inner)?
        }
        None => vec![key],
    };
    validate_component_count(raw_components.len())?;

    let components = raw_components
        .into_iter()
        .map(|raw| {
            if raw.starts_with("urn:") {
                parse_urn(raw, depth + 1).map(UrnComponent::Urn)
            } else if let Some(reason) = text_component_problem(raw) {
                Err(ValidationError::invalid_urn(s, reason))
            } else {
                Ok(UrnComponent::Text(raw.to_string()))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Urn {
        entity_type: entity_type.to_string(),
        components,
    })
}

/// Split a tuple body on commas that are not inside nested parentheses
fn split_top_level<'a>(whole: &str, inner: &'a str) -> Result<Vec<&'a str>, ValidationError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ValidationError::invalid_urn(whole, "unbalanced parentheses"))?;
            }
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ValidationError::invalid_urn(whole, "unbalanced parentheses"));
    }
    parts.push(&inner[start..]);
    Ok(parts)
}

impl Serialize for Urn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Urn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed views
// ─────────────────────────────────────────────────────────────────────────────

/// `urn:li:dataFlow:(<orchestrator>,<flowId>,<cluster>)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataFlowUrn {
    urn: Urn,
    pub orchestrator: String,
    pub flow_id: String,
    pub cluster: String,
}

impl DataFlowUrn {
    pub fn new(orchestrator: &str, flow_id: &str, cluster: &str) -> Result<Self, ValidationError> {
        let urn = Urn::new(
            DATA_FLOW_TYPE,
            vec![orchestrator.into(), flow_id.into(), cluster.into()],
        )?;
        Self::try_from(&urn)
    }

    pub fn as_urn(&self) -> &Urn {
        &self.urn
    }
}

impl TryFrom<&Urn> for DataFlowUrn {
    type Error = ValidationError;

    fn try_from(urn: &Urn) -> Result<Self, Self::Error> {
        urn.expect_type(DATA_FLOW_TYPE)?;
        match (urn.components().len(), urn.text(0), urn.text(1), urn.text(2)) {
            (3, Some(orchestrator), Some(flow_id), Some(cluster)) => Ok(Self {
                urn: urn.clone(),
                orchestrator: orchestrator.to_string(),
                flow_id: flow_id.to_string(),
                cluster: cluster.to_string(),
            }),
            _ => Err(ValidationError::invalid_urn(
                urn.to_string(),
                "expected key (orchestrator,flowId,cluster)",
            )),
        }
    }
}

/// `urn:li:dataJob:(<dataFlow urn>,<jobId>)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataJobUrn {
    urn: Urn,
    pub flow: DataFlowUrn,
    pub job_id: String,
}

impl DataJobUrn {
    pub fn new(flow: &DataFlowUrn, job_id: &str) -> Result<Self, ValidationError> {
        let urn = Urn::new(
            DATA_JOB_TYPE,
            vec![flow.as_urn().clone().into(), job_id.into()],
        )?;
        Self::try_from(&urn)
    }

    pub fn as_urn(&self) -> &Urn {
        &self.urn
    }
}

impl TryFrom<&Urn> for DataJobUrn {
    type Error = ValidationError;

    fn try_from(urn: &Urn) -> Result<Self, Self::Error> {
        urn.expect_type(DATA_JOB_TYPE)?;
        match (urn.components().len(), urn.nested(0), urn.text(1)) {
            (2, Some(flow), Some(job_id)) => Ok(Self {
                urn: urn.clone(),
                flow: DataFlowUrn::try_from(flow)?,
                job_id: job_id.to_string(),
            }),
            _ => Err(ValidationError::invalid_urn(
                urn.to_string(),
                "expected key (dataFlowUrn,jobId)",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = "urn:li:dataJob:(urn:li:dataFlow:(airflow,etl_flow,PROD),load_users)";

    #[test]
    fn test_parse_nested_urn() {
        let urn: Urn = JOB.parse().unwrap();
        assert_eq!(urn.entity_type(), "dataJob");
        assert_eq!(urn.components().len(), 2);
        assert_eq!(urn.nested(0).unwrap().entity_type(), "dataFlow");
        assert_eq!(urn.text(1), Some("load_users"));
        assert_eq!(urn.to_string(), JOB);
    }

    #[test]
    fn test_single_component_urn() {
        let urn: Urn = "urn:li:corpuser:alice".parse().unwrap();
        assert_eq!(urn, Urn::corp_user("alice").unwrap());
        assert_eq!(urn.to_string(), "urn:li:corpuser:alice");
    }

    #[test]
    fn test_dataset_constructor() {
        let urn = Urn::dataset("hive", "db.raw_users", "PROD").unwrap();
        assert_eq!(
            urn.to_string(),
            "urn:li:dataset:(urn:li:dataPlatform:hive,db.raw_users,PROD)"
        );
        assert_eq!(urn.to_string().parse::<Urn>().unwrap(), urn);
    }

    #[test]
    fn test_invalid_urns() {
        for bad in [
            "",
            "raw_users",
            "urn:li:dataset",
            "urn:li::x",
            "urn:li:dataset:(a,b",
            "urn:li:dataset:(a,(b)",
            "urn:li:dataset:(a,b))",
            "urn:li:dataset:(a,,b)",
            "urn:li:dataset:()",
            "urn:li:data-set:x",
        ] {
            assert!(bad.parse::<Urn>().is_err(), "expected '{}' to be rejected", bad);
        }
    }

    #[test]
    fn test_reserved_characters_rejected_by_constructor() {
        assert!(Urn::corp_user("a,b").is_err());
        assert!(Urn::corp_user("").is_err());
    }

    #[test]
    fn test_too_many_components() {
        let key = vec!["x"; 20].join(",");
        let err = format!("urn:li:dataset:({})", key).parse::<Urn>().unwrap_err();
        assert!(matches!(err, ValidationError::TooManyComponents { count: 20, .. }));
    }

    #[test]
    fn test_serde_as_string() {
        let urn: Urn = JOB.parse().unwrap();
        let json = serde_json::to_string(&urn).unwrap();
        assert_eq!(json, format!("\"{}\"", JOB));
        let back: Urn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, urn);
        assert!(serde_json::from_str::<Urn>("\"nope\"").is_err());
    }

    #[test]
    fn test_data_job_decomposition() {
        let urn: Urn = JOB.parse().unwrap();
        let job = DataJobUrn::try_from(&urn).unwrap();
        assert_eq!(job.job_id, "load_users");
        assert_eq!(job.flow.flow_id, "etl_flow");
        assert_eq!(job.flow.orchestrator, "airflow");
        assert_eq!(job.flow.cluster, "PROD");
        assert_eq!(job.as_urn(), &urn);
    }

    #[test]
    fn test_typed_constructors_match_parse() {
        let flow = DataFlowUrn::new("airflow", "etl_flow", "PROD").unwrap();
        let job = DataJobUrn::new(&flow, "load_users").unwrap();
        assert_eq!(job.as_urn().to_string(), JOB);
    }

    #[test]
    fn test_decomposition_rejects_wrong_shape() {
        let wrong_type: Urn = "urn:li:corpuser:alice".parse().unwrap();
        assert!(matches!(
            DataJobUrn::try_from(&wrong_type),
            Err(ValidationError::UnexpectedEntityType { .. })
        ));

        let wrong_key: Urn = "urn:li:dataJob:(etl_flow,load_users)".parse().unwrap();
        assert!(matches!(
            DataJobUrn::try_from(&wrong_key),
            Err(ValidationError::InvalidUrn { .. })
        ));

        let short_flow: Urn = "urn:li:dataFlow:(airflow,etl_flow)".parse().unwrap();
        assert!(DataFlowUrn::try_from(&short_flow).is_err());
    }
}
