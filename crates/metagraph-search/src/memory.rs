//! In-memory search sink

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::adapter::SearchPayload;
use crate::error::SearchError;
use crate::traits::{Result, SearchSink};

/// In-memory search sink keyed by document id
///
/// Patches merge field by field; fields a patch does not carry keep their
/// stored value.
pub struct MemorySearchSink {
    documents: RwLock<BTreeMap<String, SearchPayload>>,
}

impl MemorySearchSink {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemorySearchSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchSink for MemorySearchSink {
    async fn upsert_document_patch(&self, payload: &SearchPayload) -> Result<()> {
        let mut documents = self.documents.write().map_err(SearchError::lock)?;
        match documents.get_mut(&payload.id) {
            Some(document) => {
                if document.document_type != payload.document_type {
                    tracing::warn!(
                        id = %payload.id,
                        stored = %document.document_type,
                        patch = %payload.document_type,
                        "Document type changed"
                    );
                    document.document_type = payload.document_type.clone();
                }
                for (field, value) in &payload.body {
                    document.body.insert(field.clone(), value.clone());
                }
            }
            None => {
                documents.insert(payload.id.clone(), payload.clone());
            }
        }

        tracing::trace!(id = %payload.id, fields = payload.body.len(), "Merged document patch");
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<SearchPayload>> {
        let documents = self.documents.read().map_err(SearchError::lock)?;
        Ok(documents.get(id).cloned())
    }

    async fn get_all_documents(&self) -> Result<Vec<SearchPayload>> {
        let documents = self.documents.read().map_err(SearchError::lock)?;
        Ok(documents.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::to_payload;
    use crate::index::IndexRegistry;
    use metagraph_core::{
        DataFlowUrn, DataJobInfo, DataJobSnapshot, DataJobUrn, Owner, Ownership, OwnershipType,
        Urn,
    };

    fn job() -> DataJobUrn {
        let flow = DataFlowUrn::new("airflow", "etl_flow", "PROD").unwrap();
        DataJobUrn::new(&flow, "load_users").unwrap()
    }

    async fn publish(sink: &MemorySearchSink, snapshot: DataJobSnapshot) {
        let patches = IndexRegistry::new().process(&snapshot.into()).unwrap();
        for patch in &patches {
            sink.upsert_document_patch(&to_payload(patch).unwrap())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_patches_merge_into_one_document() {
        let sink = MemorySearchSink::new();
        let snapshot = DataJobSnapshot::new(job().as_urn().clone())
            .with_aspect(DataJobInfo::new("Load users").with_description("nightly"))
            .with_aspect(Ownership::new(vec![Owner::new(
                Urn::corp_user("alice").unwrap(),
                OwnershipType::Developer,
            )]));
        publish(&sink, snapshot).await;

        let documents = sink.get_all_documents().await.unwrap();
        assert_eq!(documents.len(), 1);
        let body = &documents[0].body;
        assert_eq!(body["name"], "Load users");
        assert_eq!(body["description"], "nightly");
        assert_eq!(body["jobId"], "load_users");
        assert_eq!(body["owners"], serde_json::json!(["alice"]));
    }

    #[tokio::test]
    async fn test_merge_leaves_untouched_fields() {
        let sink = MemorySearchSink::new();
        let urn = job().as_urn().clone();
        publish(
            &sink,
            DataJobSnapshot::new(urn.clone()).with_aspect(DataJobInfo::new("Load users")),
        )
        .await;
        publish(
            &sink,
            DataJobSnapshot::new(urn.clone()).with_aspect(Ownership::default()),
        )
        .await;

        let document = sink
            .get_document(&urn.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(document.body["name"], "Load users");
        assert_eq!(document.body["owners"], serde_json::json!([]));
        assert_eq!(document.document_type, "dataJob");
    }

    #[tokio::test]
    async fn test_missing_document() {
        let sink = MemorySearchSink::new();
        assert!(sink.get_document("urn:li:corpuser:nobody").await.unwrap().is_none());
    }
}
