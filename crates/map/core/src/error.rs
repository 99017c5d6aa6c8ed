//! Common error infrastructure for map-core.
//!
//! Decoding itself never fails: partially populated buffers are treated as
//! undiscovered cells. The errors here cover the edges of the crate (building a
//! buffer, parsing a floor identifier) and registry invariant checks used by
//! tests.

/// Severity level of an error, used for categorization and logging priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input supplied by a caller; reject it without retrying.
    ///
    /// Examples: buffer of the wrong length, unknown floor identifier
    Validation,

    /// Internal inconsistency that indicates a bug.
    ///
    /// Examples: a registry key pointing to a room that does not list it
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all map-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity by who is at fault, not by impact
pub trait MapError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a stable identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels() {
        assert_eq!(ErrorSeverity::Validation.as_str(), "validation");
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(!ErrorSeverity::Validation.is_internal());
    }
}
