//! Change event consumer
//!
//! Fetches the snapshot named by a change event, derives graph and search
//! updates from it, and publishes them to the configured sinks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use metagraph_core::{EntityRecord, EntitySnapshot, GraphRegistry, RelationshipUpdate, Urn};
use metagraph_search::{
    to_payload, DocumentPatch, IndexRegistry, SearchError, SearchPayload, SearchSink,
};
use metagraph_storage::{GraphSink, StorageError};

/// Notification that the snapshot for `urn` changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub urn: Urn,
    pub created_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(urn: Urn) -> Self {
        Self {
            urn,
            created_at: Utc::now(),
        }
    }
}

/// Consumer errors, always tagged with the urn being processed
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No snapshot found for {urn}")]
    MissingSnapshot { urn: String },

    #[error("Snapshot source failed for {urn}: {message}")]
    Source { urn: String, message: String },

    #[error("Failed to derive updates for {urn}: {source}")]
    Derive {
        urn: String,
        #[source]
        source: metagraph_core::Error,
    },

    #[error("Failed to build search payload for {urn}: {source}")]
    Payload {
        urn: String,
        #[source]
        source: SearchError,
    },

    #[error("Graph sink rejected update for {urn}: {source}")]
    Graph {
        urn: String,
        #[source]
        source: StorageError,
    },

    #[error("Search sink rejected patch for {urn}: {source}")]
    Search {
        urn: String,
        #[source]
        source: SearchError,
    },
}

impl PipelineError {
    pub fn urn(&self) -> &str {
        match self {
            Self::MissingSnapshot { urn }
            | Self::Source { urn, .. }
            | Self::Derive { urn, .. }
            | Self::Payload { urn, .. }
            | Self::Graph { urn, .. }
            | Self::Search { urn, .. } => urn,
        }
    }
}

/// Where the consumer reads snapshots from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn get_snapshot(&self, urn: &Urn) -> Result<Option<EntitySnapshot>, PipelineError>;
}

/// Snapshot source backed by a map, for files and tests
#[derive(Default)]
pub struct MemorySnapshotSource {
    snapshots: RwLock<HashMap<Urn, EntitySnapshot>>,
}

impl MemorySnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot, replacing any earlier one for the same urn
    pub fn insert(&self, snapshot: EntitySnapshot) -> Result<(), PipelineError> {
        let urn = snapshot.urn().clone();
        let mut snapshots = self.snapshots.write().map_err(|e| PipelineError::Source {
            urn: urn.to_string(),
            message: format!("Lock error: {}", e),
        })?;
        snapshots.insert(urn, snapshot);
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for MemorySnapshotSource {
    async fn get_snapshot(&self, urn: &Urn) -> Result<Option<EntitySnapshot>, PipelineError> {
        let snapshots = self.snapshots.read().map_err(|e| PipelineError::Source {
            urn: urn.to_string(),
            message: format!("Lock error: {}", e),
        })?;
        Ok(snapshots.get(urn).cloned())
    }
}

/// Everything derived from one snapshot, ready to publish
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub urn: Urn,
    pub entities: Vec<EntityRecord>,
    pub relationship_updates: Vec<RelationshipUpdate>,
    pub documents: Vec<DocumentPatch>,
    #[serde(skip)]
    pub payloads: Vec<SearchPayload>,
}

/// A replayed event that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFailure {
    pub urn: String,
    pub error: String,
}

/// Outcome of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub processed: usize,
    pub failures: Vec<ReplayFailure>,
}

/// Replay tuning
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub concurrency: usize,
    pub fail_fast: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fail_fast: false,
        }
    }
}

/// Derive graph and search updates for a snapshot without publishing
///
/// Every payload is serialized here, so a record that cannot be serialized
/// fails the snapshot before any sink is touched.
pub fn derive(
    graph: &GraphRegistry,
    index: &IndexRegistry,
    snapshot: &EntitySnapshot,
) -> Result<Derived, PipelineError> {
    let urn = snapshot.urn();
    let derive_error = |source| PipelineError::Derive {
        urn: urn.to_string(),
        source,
    };

    let graph_update = graph.process(snapshot).map_err(derive_error)?;
    let documents = index.process(snapshot).map_err(derive_error)?;
    let payloads = documents
        .iter()
        .map(to_payload)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| PipelineError::Payload {
            urn: urn.to_string(),
            source,
        })?;

    Ok(Derived {
        urn: urn.clone(),
        entities: graph_update.entities,
        relationship_updates: graph_update.relationship_updates,
        documents,
        payloads,
    })
}

/// The change event consumer
pub struct Pipeline {
    source: Arc<dyn SnapshotSource>,
    graph_sink: Arc<dyn GraphSink>,
    search_sink: Arc<dyn SearchSink>,
    graph: GraphRegistry,
    index: IndexRegistry,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        graph_sink: Arc<dyn GraphSink>,
        search_sink: Arc<dyn SearchSink>,
    ) -> Self {
        Self {
            source,
            graph_sink,
            search_sink,
            graph: GraphRegistry::new(),
            index: IndexRegistry::new(),
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Publish derived updates: entities, relationship updates in order,
    /// then document payloads
    pub async fn publish(&self, derived: &Derived) -> Result<(), PipelineError> {
        let graph_error = |source| PipelineError::Graph {
            urn: derived.urn.to_string(),
            source,
        };

        for entity in &derived.entities {
            self.graph_sink
                .upsert_entity(entity)
                .await
                .map_err(graph_error)?;
        }
        for update in &derived.relationship_updates {
            self.graph_sink.apply(update).await.map_err(graph_error)?;
        }
        self.search_sink
            .upsert_all(&derived.payloads)
            .await
            .map_err(|source| PipelineError::Search {
                urn: derived.urn.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn fetch_and_derive(&self, urn: &Urn) -> Result<Derived, PipelineError> {
        let snapshot = self
            .source
            .get_snapshot(urn)
            .await?
            .ok_or_else(|| PipelineError::MissingSnapshot {
                urn: urn.to_string(),
            })?;
        derive(&self.graph, &self.index, &snapshot)
    }

    /// Process a single change event end to end
    pub async fn handle(&self, event: &ChangeEvent) -> Result<Derived, PipelineError> {
        let derived = self.fetch_and_derive(&event.urn).await?;
        self.publish(&derived).await?;
        tracing::debug!(
            urn = %event.urn,
            entities = derived.entities.len(),
            updates = derived.relationship_updates.len(),
            documents = derived.documents.len(),
            "Handled change event"
        );
        Ok(derived)
    }

    /// Process a batch of events
    ///
    /// With `concurrency` above one, derivation runs that many events ahead;
    /// publishing always happens strictly in event order. A failing event is
    /// recorded and skipped unless `fail_fast` is set.
    pub async fn replay(&self, events: &[ChangeEvent]) -> Result<ReplayReport, PipelineError> {
        let mut report = ReplayReport::default();

        if self.options.concurrency <= 1 {
            for event in events {
                let outcome = self.handle(event).await.map(|_| ());
                self.record(&mut report, event, outcome)?;
            }
        } else {
            let mut pending = stream::iter(events)
                .map(|event| async move { (event, self.fetch_and_derive(&event.urn).await) })
                .buffered(self.options.concurrency);

            while let Some((event, result)) = pending.next().await {
                let outcome = match result {
                    Ok(derived) => self.publish(&derived).await,
                    Err(e) => Err(e),
                };
                self.record(&mut report, event, outcome)?;
            }
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failures.len(),
            "Replay finished"
        );
        Ok(report)
    }

    fn record(
        &self,
        report: &mut ReplayReport,
        event: &ChangeEvent,
        outcome: Result<(), PipelineError>,
    ) -> Result<(), PipelineError> {
        match outcome {
            Ok(()) => report.processed += 1,
            Err(e) if self.options.fail_fast => {
                tracing::warn!(urn = %event.urn, "Replay stopped: {}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(urn = %event.urn, "Skipping event: {}", e);
                report.failures.push(ReplayFailure {
                    urn: e.urn().to_string(),
                    error: e.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metagraph_core::{
        DataFlowInfo, DataFlowSnapshot, DataFlowUrn, DataJobInputOutput, DataJobSnapshot,
        DataJobUrn, RelationshipType,
    };
    use metagraph_search::MemorySearchSink;
    use metagraph_storage::MemoryGraphSink;

    struct Harness {
        source: Arc<MemorySnapshotSource>,
        graph: Arc<MemoryGraphSink>,
        search: Arc<MemorySearchSink>,
        pipeline: Pipeline,
    }

    fn harness(options: PipelineOptions) -> Harness {
        let source = Arc::new(MemorySnapshotSource::new());
        let graph = Arc::new(MemoryGraphSink::new());
        let search = Arc::new(MemorySearchSink::new());
        let pipeline = Pipeline::new(source.clone(), graph.clone(), search.clone())
            .with_options(options);
        Harness {
            source,
            graph,
            search,
            pipeline,
        }
    }

    fn flow() -> DataFlowUrn {
        DataFlowUrn::new("airflow", "etl_flow", "PROD").unwrap()
    }

    fn job(name: &str) -> DataJobUrn {
        DataJobUrn::new(&flow(), name).unwrap()
    }

    fn dataset(name: &str) -> Urn {
        Urn::dataset("hive", name, "PROD").unwrap()
    }

    fn job_snapshot(name: &str, input: &str, output: &str) -> EntitySnapshot {
        DataJobSnapshot::new(job(name).as_urn().clone())
            .with_aspect(DataJobInputOutput::new(
                vec![dataset(input)],
                vec![dataset(output)],
            ))
            .into()
    }

    #[tokio::test]
    async fn test_handle_publishes_graph_and_documents() {
        let h = harness(PipelineOptions::default());
        h.source
            .insert(job_snapshot("load_users", "raw_users", "clean_users"))
            .unwrap();

        let derived = h
            .pipeline
            .handle(&ChangeEvent::new(job("load_users").as_urn().clone()))
            .await
            .unwrap();
        assert_eq!(derived.relationship_updates.len(), 3);
        assert_eq!(derived.payloads.len(), 1);

        let graph = h.graph.load_graph().await.unwrap();
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.edges.len(), 3);

        let document = h
            .search
            .get_document(&job("load_users").as_urn().to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(document.body["browsePaths"][0], "/etl_flow/load_users");
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_an_error() {
        let h = harness(PipelineOptions::default());
        let urn = job("ghost").as_urn().clone();
        let err = h.pipeline.handle(&ChangeEvent::new(urn.clone())).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingSnapshot { .. }));
        assert_eq!(err.urn(), urn.to_string());
    }

    #[tokio::test]
    async fn test_derive_failure_publishes_nothing() {
        let h = harness(PipelineOptions::default());
        let bad = DataJobSnapshot::new(job("load_users").as_urn().clone()).with_aspect(
            DataJobInputOutput::new(vec![Urn::corp_user("alice").unwrap()], vec![]),
        );
        h.source.insert(bad.into()).unwrap();

        let err = h
            .pipeline
            .handle(&ChangeEvent::new(job("load_users").as_urn().clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Derive { .. }));
        assert!(h.graph.load_graph().await.unwrap().entities.is_empty());
        assert!(h.search.get_all_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replay_reports_failures_and_continues() {
        let h = harness(PipelineOptions {
            concurrency: 2,
            fail_fast: false,
        });
        h.source.insert(job_snapshot("a", "raw", "mid")).unwrap();
        h.source.insert(job_snapshot("b", "mid", "out")).unwrap();

        let events = vec![
            ChangeEvent::new(job("a").as_urn().clone()),
            ChangeEvent::new(job("missing").as_urn().clone()),
            ChangeEvent::new(job("b").as_urn().clone()),
        ];
        let report = h.pipeline.replay(&events).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].urn, job("missing").as_urn().to_string());

        let upstream = h
            .graph
            .get_edges_from(&dataset("out"), Some(RelationshipType::DownstreamOf))
            .await
            .unwrap();
        assert_eq!(upstream[0].destination, dataset("mid"));
    }

    #[tokio::test]
    async fn test_sequential_replay_matches_buffered() {
        let sequential = harness(PipelineOptions {
            concurrency: 1,
            fail_fast: false,
        });
        let buffered = harness(PipelineOptions {
            concurrency: 3,
            fail_fast: false,
        });
        let events = vec![
            ChangeEvent::new(job("a").as_urn().clone()),
            ChangeEvent::new(job("missing").as_urn().clone()),
            ChangeEvent::new(job("b").as_urn().clone()),
        ];

        let mut reports = Vec::new();
        for h in [&sequential, &buffered] {
            h.source.insert(job_snapshot("a", "raw", "mid")).unwrap();
            h.source.insert(job_snapshot("b", "mid", "out")).unwrap();
            reports.push(h.pipeline.replay(&events).await.unwrap());
        }

        assert_eq!(reports[0], reports[1]);
        assert_eq!(reports[0].processed, 2);
        assert_eq!(
            sequential.graph.load_graph().await.unwrap(),
            buffered.graph.load_graph().await.unwrap()
        );
    }

    #[test]
    fn test_derive_without_sinks() {
        let snapshot = job_snapshot("load_users", "raw_users", "clean_users");
        let derived = derive(&GraphRegistry::new(), &IndexRegistry::new(), &snapshot).unwrap();

        assert_eq!(derived.urn, *job("load_users").as_urn());
        assert_eq!(derived.entities.len(), 1);
        assert_eq!(derived.relationship_updates.len(), 3);
        assert_eq!(derived.payloads.len(), derived.documents.len());
        assert_eq!(derived.payloads[0].document_type, "dataJob");
    }

    #[tokio::test]
    async fn test_replay_fail_fast_stops() {
        let h = harness(PipelineOptions {
            concurrency: 1,
            fail_fast: true,
        });
        h.source.insert(job_snapshot("b", "mid", "out")).unwrap();

        let events = vec![
            ChangeEvent::new(job("missing").as_urn().clone()),
            ChangeEvent::new(job("b").as_urn().clone()),
        ];
        assert!(h.pipeline.replay(&events).await.is_err());
        assert!(h.graph.get_all_edges().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redelivery_replaces_previous_state() {
        let h = harness(PipelineOptions::default());
        let urn = job("load_users").as_urn().clone();

        h.source
            .insert(job_snapshot("load_users", "raw_users", "clean_users"))
            .unwrap();
        h.pipeline.handle(&ChangeEvent::new(urn.clone())).await.unwrap();

        h.source
            .insert(job_snapshot("load_users", "raw_orders", "clean_users"))
            .unwrap();
        h.pipeline.handle(&ChangeEvent::new(urn.clone())).await.unwrap();

        let consumes = h
            .graph
            .get_edges_from(&urn, Some(RelationshipType::Consumes))
            .await
            .unwrap();
        assert_eq!(consumes.len(), 1);
        assert_eq!(consumes[0].destination, dataset("raw_orders"));
    }

    #[tokio::test]
    async fn test_data_flow_event() {
        let h = harness(PipelineOptions::default());
        let snapshot = DataFlowSnapshot::new(flow().as_urn().clone())
            .with_aspect(DataFlowInfo::new("ETL"));
        h.source.insert(snapshot.into()).unwrap();

        let derived = h
            .pipeline
            .handle(&ChangeEvent::new(flow().as_urn().clone()))
            .await
            .unwrap();
        assert!(derived.relationship_updates.is_empty());
        assert_eq!(derived.documents.len(), 2);

        let document = h
            .search
            .get_document(&flow().as_urn().to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(document.body["name"], "ETL");
        assert_eq!(document.body["cluster"], "PROD");
    }

    #[test]
    fn test_change_event_wire_form() {
        let event: ChangeEvent = serde_json::from_value(serde_json::json!({
            "urn": "urn:li:dataFlow:(airflow,etl_flow,PROD)",
            "createdAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(event.urn, *flow().as_urn());
        assert_eq!(event.created_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }
}
