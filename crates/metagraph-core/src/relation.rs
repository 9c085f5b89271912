//! Relationship (edge) types and update commands

use crate::urn::Urn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of a directed relationship between two urns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipType {
    /// entity -> dataset it writes
    Produces,
    /// entity -> dataset it reads
    Consumes,
    /// downstream dataset -> upstream dataset
    DownstreamOf,
    /// entity -> owning user
    OwnedBy,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Produces => "Produces",
            Self::Consumes => "Consumes",
            Self::DownstreamOf => "DownstreamOf",
            Self::OwnedBy => "OwnedBy",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How edges already stored must be reconciled when an update is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemovalOption {
    /// Append only; nothing is deleted
    RemoveNone,
    /// Delete every edge of the update's type leaving the update's source
    /// before inserting the new edges
    #[default]
    RemoveAllEdgesFromSource,
    /// Delete existing edges of the same type between each new edge's
    /// source and destination before inserting it
    RemoveAllEdgesFromSourceToDestination,
}

/// A typed, directed relationship instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    pub source: Urn,

    pub destination: Urn,

    /// Extra edge attributes (e.g. ownership type)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Edge {
    pub fn new(relationship_type: RelationshipType, source: Urn, destination: Urn) -> Self {
        Self {
            relationship_type,
            source,
            destination,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Identity used for de-duplication at a sink (properties excluded)
    pub fn key(&self) -> (RelationshipType, &Urn, &Urn) {
        (self.relationship_type, &self.source, &self.destination)
    }
}

/// Command to a graph sink: a homogeneous edge list plus its removal policy
///
/// `source` is the urn of the entity whose snapshot produced the update. It is
/// carried even when `edges` is empty so that a replace-all update can still
/// clear edges left over from a previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipUpdate {
    pub source: Urn,

    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    edges: Vec<Edge>,

    pub removal_option: RemovalOption,
}

impl RelationshipUpdate {
    /// Empty update of the given type and removal policy
    pub fn new(
        source: Urn,
        relationship_type: RelationshipType,
        removal_option: RemovalOption,
    ) -> Self {
        Self {
            source,
            relationship_type,
            edges: Vec::new(),
            removal_option,
        }
    }

    /// Replace-all-from-source update built from `(source, destination)` pairs
    pub fn replace_from_source(
        source: Urn,
        relationship_type: RelationshipType,
        pairs: impl IntoIterator<Item = (Urn, Urn)>,
    ) -> Self {
        let mut update = Self::new(
            source,
            relationship_type,
            RemovalOption::RemoveAllEdgesFromSource,
        );
        for (from, to) in pairs {
            update.push(from, to);
        }
        update
    }

    /// Append an edge of this update's type
    pub fn push(&mut self, source: Urn, destination: Urn) -> &mut Edge {
        self.edges
            .push(Edge::new(self.relationship_type, source, destination));
        let last = self.edges.len() - 1;
        &mut self.edges[last]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urn(name: &str) -> Urn {
        Urn::corp_user(name).unwrap()
    }

    #[test]
    fn test_update_edges_share_its_type() {
        let update = RelationshipUpdate::replace_from_source(
            urn("job"),
            RelationshipType::Consumes,
            vec![(urn("job"), urn("a")), (urn("job"), urn("b"))],
        );
        assert_eq!(update.len(), 2);
        assert_eq!(update.removal_option, RemovalOption::RemoveAllEdgesFromSource);
        assert!(update
            .edges()
            .iter()
            .all(|e| e.relationship_type == RelationshipType::Consumes));
    }

    #[test]
    fn test_empty_update_keeps_source() {
        let update = RelationshipUpdate::replace_from_source(
            urn("job"),
            RelationshipType::DownstreamOf,
            Vec::new(),
        );
        assert!(update.is_empty());
        assert_eq!(update.source, urn("job"));
    }

    #[test]
    fn test_edge_properties() {
        let mut update = RelationshipUpdate::new(
            urn("job"),
            RelationshipType::OwnedBy,
            RemovalOption::RemoveNone,
        );
        update
            .push(urn("job"), urn("alice"))
            .properties
            .insert("type".into(), "DEVELOPER".into());
        assert_eq!(update.edges()[0].properties["type"], "DEVELOPER");

        let edge = Edge::new(RelationshipType::OwnedBy, urn("job"), urn("bob"))
            .with_property("type", "DATAOWNER");
        assert_eq!(edge.key().0, RelationshipType::OwnedBy);
    }

    #[test]
    fn test_wire_form() {
        let update = RelationshipUpdate::replace_from_source(
            urn("job"),
            RelationshipType::Produces,
            vec![(urn("job"), urn("out"))],
        );
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "Produces");
        assert_eq!(value["removalOption"], "REMOVE_ALL_EDGES_FROM_SOURCE");
        assert_eq!(value["edges"][0]["destination"], "urn:li:corpuser:out");
        assert!(value["edges"][0].get("properties").is_none());
    }
}
