//! Search error types

use thiserror::Error;

/// Result type alias for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Search-specific error types
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(String),

    #[error("Failed to serialize record {urn}: {source}")]
    Serialization {
        urn: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {urn} serialized to {found}, expected a JSON object")]
    NotAnObject { urn: String, found: &'static str },
}

impl SearchError {
    pub(crate) fn lock<E: std::fmt::Display>(e: E) -> Self {
        Self::Index(format!("Lock error: {}", e))
    }

    /// Urn of the record the error is about, when there is one
    pub fn urn(&self) -> Option<&str> {
        match self {
            Self::Serialization { urn, .. } | Self::NotAnObject { urn, .. } => Some(urn),
            Self::Index(_) => None,
        }
    }
}
