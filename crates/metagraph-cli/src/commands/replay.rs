//! Replay command - run snapshots through the consumer into in-memory sinks

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use comfy_table::Table;
use serde::Serialize;

use crate::commands::{document_table, entity_table, read_snapshots};
use crate::output::{format_output, new_table, Tabular};
use crate::pipeline::{
    ChangeEvent, MemorySnapshotSource, Pipeline, PipelineOptions, ReplayReport,
};
use crate::AppContext;
use metagraph_search::{MemorySearchSink, SearchPayload, SearchSink};
use metagraph_storage::{GraphSink, MemoryGraphSink, StoredGraph};

#[derive(Args)]
pub struct ReplayArgs {
    /// Snapshot file (JSON: one snapshot or an array)
    pub file: PathBuf,

    /// Events derived concurrently (defaults to the configured value)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Stop at the first failing event
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Serialize)]
struct ReplayOutput {
    graph: StoredGraph,
    documents: Vec<SearchPayload>,
    #[serde(flatten)]
    report: ReplayReport,
}

impl Tabular for ReplayOutput {
    fn tables(&self) -> Vec<(&'static str, Table)> {
        let mut edges = new_table(&["TYPE", "SOURCE", "DESTINATION"]);
        for edge in &self.graph.edges {
            edges.add_row(vec![
                edge.relationship_type.to_string(),
                edge.source.to_string(),
                edge.destination.to_string(),
            ]);
        }

        let mut failures = new_table(&["URN", "ERROR"]);
        for failure in &self.report.failures {
            failures.add_row(vec![failure.urn.clone(), failure.error.clone()]);
        }

        vec![
            ("ENTITIES", entity_table(&self.graph.entities)),
            ("EDGES", edges),
            ("DOCUMENTS", document_table(&self.documents)),
            ("FAILURES", failures),
        ]
    }
}

pub async fn run(args: &ReplayArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let snapshots = read_snapshots(&args.file)?;

    let source = Arc::new(MemorySnapshotSource::new());
    let mut events = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        events.push(ChangeEvent::new(snapshot.urn().clone()));
        source.insert(snapshot)?;
    }

    let options = PipelineOptions {
        concurrency: args.concurrency.unwrap_or(ctx.config.concurrency).max(1),
        fail_fast: args.fail_fast || ctx.config.fail_fast,
    };
    let graph_sink = Arc::new(MemoryGraphSink::new());
    let search_sink = Arc::new(MemorySearchSink::new());
    let pipeline =
        Pipeline::new(source, graph_sink.clone(), search_sink.clone()).with_options(options);

    tracing::info!("Replaying {} event(s)", events.len());
    let report = pipeline.replay(&events).await?;

    let output = ReplayOutput {
        graph: graph_sink.load_graph().await?,
        documents: search_sink.get_all_documents().await?,
        report,
    };
    println!("{}", format_output(&output, ctx.format)?);

    if !output.report.failures.is_empty() {
        anyhow::bail!(
            "{} of {} event(s) failed",
            output.report.failures.len(),
            events.len()
        );
    }
    Ok(())
}
