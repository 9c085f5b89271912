//! Output formatting utilities

use std::str::FromStr;

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Pretty,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "table" => Ok(Self::Table),
            other => anyhow::bail!("Unknown output format '{}' (json, pretty, table)", other),
        }
    }
}

/// Table with the given column headers and no rows
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(headers.to_vec());
    table
}

/// Data that has a table rendering
pub trait Tabular {
    fn tables(&self) -> Vec<(&'static str, Table)>;
}

/// Format output based on format type
pub fn format_output<T: Serialize + Tabular>(
    data: &T,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(data)?),
        OutputFormat::Pretty => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Table => {
            let sections: Vec<String> = data
                .tables()
                .into_iter()
                .filter(|(_, table)| table.row_iter().next().is_some())
                .map(|(title, table)| format!("{}\n{}", title, table))
                .collect();
            Ok(sections.join("\n\n"))
        }
    }
}
