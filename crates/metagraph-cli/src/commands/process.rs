//! Process command - derive updates from snapshots without publishing

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use comfy_table::Table;
use serde::Serialize;

use crate::commands::{document_table, entity_table, read_snapshots};
use crate::output::{format_output, new_table, Tabular};
use crate::pipeline::{derive, Derived};
use crate::AppContext;
use metagraph_core::GraphRegistry;
use metagraph_search::IndexRegistry;

#[derive(Args)]
pub struct ProcessArgs {
    /// Snapshot file (JSON: one snapshot or an array)
    pub file: PathBuf,
}

#[derive(Serialize)]
#[serde(transparent)]
struct ProcessOutput(Vec<Derived>);

impl Tabular for ProcessOutput {
    fn tables(&self) -> Vec<(&'static str, Table)> {
        let mut relationships = new_table(&["TYPE", "SOURCE", "DESTINATION", "REMOVAL"]);
        for update in self.0.iter().flat_map(|d| &d.relationship_updates) {
            for edge in update.edges() {
                relationships.add_row(vec![
                    edge.relationship_type.to_string(),
                    edge.source.to_string(),
                    edge.destination.to_string(),
                    format!("{:?}", update.removal_option),
                ]);
            }
        }

        vec![
            ("ENTITIES", entity_table(self.0.iter().flat_map(|d| &d.entities))),
            ("RELATIONSHIPS", relationships),
            ("DOCUMENTS", document_table(self.0.iter().flat_map(|d| &d.payloads))),
        ]
    }
}

pub async fn run(args: &ProcessArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let snapshots = read_snapshots(&args.file)?;
    let graph = GraphRegistry::new();
    let index = IndexRegistry::new();

    let mut results = Vec::with_capacity(snapshots.len());
    for snapshot in &snapshots {
        let derived = derive(&graph, &index, snapshot)
            .with_context(|| format!("Failed to process snapshot {}", snapshot.urn()))?;
        results.push(derived);
    }

    println!("{}", format_output(&ProcessOutput(results), ctx.format)?);
    Ok(())
}
