//! Error types for separation operations.

use thiserror::Error;

/// Errors that can occur while separating parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeparateError {
    /// Invalid solver parameters.
    #[error("invalid parameters: {reason}")]
    InvalidParams {
        /// Description of the parameter error.
        reason: String,
    },

    /// The collision collaborator failed to answer a query.
    ///
    /// This is fatal for the step that issued the query; the solver does
    /// not guess a fallback pose.
    #[error("collision query failed: {reason}")]
    Query {
        /// Description of what went wrong.
        reason: String,
    },
}

impl SeparateError {
    /// Create an invalid parameters error.
    #[must_use]
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    /// Create a collision query error.
    #[must_use]
    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query {
            reason: reason.into(),
        }
    }

    /// Check if this is a parameter validation error.
    #[must_use]
    pub fn is_params_error(&self) -> bool {
        matches!(self, Self::InvalidParams { .. })
    }

    /// Check if this is a collision query error.
    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

/// Result type for separation operations.
pub type Result<T> = std::result::Result<T, SeparateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SeparateError::invalid_params("move_per_step must be positive");
        assert!(err.to_string().contains("move_per_step"));

        let err = SeparateError::query("backend unavailable");
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn test_error_predicates() {
        let err = SeparateError::invalid_params("bad value");
        assert!(err.is_params_error());
        assert!(!err.is_query_error());

        let err = SeparateError::query("boom");
        assert!(err.is_query_error());
        assert!(!err.is_params_error());
    }
}
