//! Event adapter - turns index records into serialized search payloads

use crate::document::DocumentPatch;
use crate::error::{SearchError, SearchResult};
use metagraph_core::EntityRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record that can be published to a search sink
pub trait IndexRecord: Serialize {
    /// Urn string identifying the target document
    fn id(&self) -> String;

    fn document_type(&self) -> &'static str;
}

impl IndexRecord for DocumentPatch {
    fn id(&self) -> String {
        self.urn().to_string()
    }

    fn document_type(&self) -> &'static str {
        DocumentPatch::document_type(self)
    }
}

impl IndexRecord for EntityRecord {
    fn id(&self) -> String {
        self.urn().to_string()
    }

    fn document_type(&self) -> &'static str {
        self.entity_type()
    }
}

/// Serialized form of one record, ready for a search sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub id: String,
    pub document_type: String,
    pub body: Map<String, Value>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize a record into a payload
///
/// Fails without producing a payload when the record cannot be serialized or
/// does not serialize to a JSON object.
pub fn to_payload<R: IndexRecord + ?Sized>(record: &R) -> SearchResult<SearchPayload> {
    let id = record.id();
    let value = serde_json::to_value(record).map_err(|source| SearchError::Serialization {
        urn: id.clone(),
        source,
    })?;

    match value {
        Value::Object(body) => Ok(SearchPayload {
            id,
            document_type: record.document_type().to_string(),
            body,
        }),
        other => Err(SearchError::NotAnObject {
            urn: id,
            found: json_kind(&other),
        }),
    }
}
