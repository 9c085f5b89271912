//! Error types for metagraph core

use thiserror::Error;

pub use crate::limits::ValidationError;

/// Result type alias using metagraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for relationship and document derivation functions
pub type DerivationResult<T> = std::result::Result<T, DerivationError>;

/// A builder or document function hit a shape it cannot derive from
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Derivation failed for {urn} (aspect {aspect}, builder {builder}): {message}")]
pub struct DerivationError {
    pub urn: String,
    pub aspect: String,
    pub builder: &'static str,
    pub message: String,
}

impl DerivationError {
    pub fn new(
        urn: impl ToString,
        aspect: impl Into<String>,
        builder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            urn: urn.to_string(),
            aspect: aspect.into(),
            builder,
            message: message.into(),
        }
    }
}

/// Metagraph error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

impl Error {
    /// Urn of the snapshot that failed, when the error carries one
    pub fn urn(&self) -> Option<&str> {
        match self {
            Self::Validation(ValidationError::InvalidUrn { urn, .. })
            | Self::Validation(ValidationError::UnexpectedEntityType { urn, .. })
            | Self::Validation(ValidationError::DuplicateAspect { urn, .. }) => Some(urn),
            Self::Derivation(e) => Some(&e.urn),
            _ => None,
        }
    }
}
