//! CLI command implementations

pub mod completions;
pub mod config;
pub mod process;
pub mod replay;

use std::path::Path;

use anyhow::Context;
use comfy_table::Table;
use serde::Deserialize;

use crate::output::new_table;
use metagraph_core::{EntityRecord, EntitySnapshot};
use metagraph_search::SearchPayload;

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<EntitySnapshot>),
    One(EntitySnapshot),
}

/// Read one snapshot or an array of snapshots from a JSON file
pub fn read_snapshots(path: &Path) -> anyhow::Result<Vec<EntitySnapshot>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: SnapshotFile = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid snapshot file {}", path.display()))?;
    let snapshots = match file {
        SnapshotFile::Many(snapshots) => snapshots,
        SnapshotFile::One(snapshot) => vec![snapshot],
    };
    tracing::debug!("Read {} snapshot(s) from {:?}", snapshots.len(), path);
    Ok(snapshots)
}

pub(crate) fn entity_table<'a>(entities: impl IntoIterator<Item = &'a EntityRecord>) -> Table {
    let mut table = new_table(&["TYPE", "URN", "REMOVED"]);
    for entity in entities {
        table.add_row(vec![
            entity.entity_type().to_string(),
            entity.urn().to_string(),
            entity.is_removed().to_string(),
        ]);
    }
    table
}

pub(crate) fn document_table<'a>(payloads: impl IntoIterator<Item = &'a SearchPayload>) -> Table {
    let mut table = new_table(&["TYPE", "ID", "FIELDS"]);
    for payload in payloads {
        let fields: Vec<&str> = payload
            .body
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "urn")
            .collect();
        table.add_row(vec![
            payload.document_type.clone(),
            payload.id.clone(),
            fields.join(","),
        ]);
    }
    table
}
