//! Structural validation limits for urns and snapshots

/// Maximum length of a textual urn (1024 chars)
pub const MAX_URN_LEN: usize = 1024;

/// Maximum components in a single urn key tuple (16)
pub const MAX_URN_COMPONENTS: usize = 16;

/// Maximum nesting depth of urns inside urns (8)
pub const MAX_URN_DEPTH: usize = 8;

/// Maximum aspects carried by one snapshot (64)
pub const MAX_ASPECTS_PER_SNAPSHOT: usize = 64;

/// Validation error type
///
/// Raised for malformed urns and snapshots. Fatal for the snapshot being
/// processed; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyUrn,
    UrnTooLong { len: usize, max: usize },
    InvalidUrn { urn: String, reason: String },
    TooManyComponents { count: usize, max: usize },
    UrnTooDeep { depth: usize, max: usize },
    UnexpectedEntityType {
        urn: String,
        expected: String,
        found: String,
    },
    DuplicateAspect { urn: String, aspect: String },
    TooManyAspects { count: usize, max: usize },
}

impl ValidationError {
    pub fn invalid_urn(urn: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrn {
            urn: urn.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrn => write!(f, "Urn cannot be empty"),
            Self::UrnTooLong { len, max } => {
                write!(f, "Urn too long: {} chars (max {})", len, max)
            }
            Self::InvalidUrn { urn, reason } => write!(f, "Invalid urn '{}': {}", urn, reason),
            Self::TooManyComponents { count, max } => {
                write!(f, "Too many urn components: {} (max {})", count, max)
            }
            Self::UrnTooDeep { depth, max } => {
                write!(f, "Urn nested too deeply: {} levels (max {})", depth, max)
            }
            Self::UnexpectedEntityType {
                urn,
                expected,
                found,
            } => write!(
                f,
                "Urn '{}' has entity type '{}', expected '{}'",
                urn, found, expected
            ),
            Self::DuplicateAspect { urn, aspect } => {
                write!(f, "Snapshot for '{}' carries aspect '{}' more than once", urn, aspect)
            }
            Self::TooManyAspects { count, max } => {
                write!(f, "Too many aspects in snapshot: {} (max {})", count, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate the raw length of a textual urn
pub fn validate_urn_len(urn: &str) -> Result<(), ValidationError> {
    if urn.is_empty() {
        return Err(ValidationError::EmptyUrn);
    }
    if urn.len() > MAX_URN_LEN {
        return Err(ValidationError::UrnTooLong {
            len: urn.len(),
            max: MAX_URN_LEN,
        });
    }
    Ok(())
}

/// Validate the number of components in one key tuple
pub fn validate_component_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_URN_COMPONENTS {
        return Err(ValidationError::TooManyComponents {
            count,
            max: MAX_URN_COMPONENTS,
        });
    }
    Ok(())
}

/// Validate urn nesting depth
pub fn validate_urn_depth(depth: usize) -> Result<(), ValidationError> {
    if depth > MAX_URN_DEPTH {
        return Err(ValidationError::UrnTooDeep {
            depth,
            max: MAX_URN_DEPTH,
        });
    }
    Ok(())
}

/// Validate snapshot aspect count
pub fn validate_aspect_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_ASPECTS_PER_SNAPSHOT {
        return Err(ValidationError::TooManyAspects {
            count,
            max: MAX_ASPECTS_PER_SNAPSHOT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_urn_len() {
        assert!(validate_urn_len("urn:li:corpuser:alice").is_ok());
        assert_eq!(validate_urn_len(""), Err(ValidationError::EmptyUrn));
        assert!(validate_urn_len(&"x".repeat(MAX_URN_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_aspect_count() {
        assert!(validate_aspect_count(4).is_ok());
        assert!(validate_aspect_count(MAX_ASPECTS_PER_SNAPSHOT + 1).is_err());
    }

    #[test]
    fn test_display_names_offending_urn() {
        let err = ValidationError::invalid_urn("urn:li:x", "missing key");
        assert_eq!(err.to_string(), "Invalid urn 'urn:li:x': missing key");
    }
}
