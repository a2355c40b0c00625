//! DOM Errors
//!
//! Failure taxonomy shared by every tree, attribute and dispatch operation.

use std::fmt;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// Error raised by an observer callback
pub type ObserverError = Box<dyn std::error::Error + 'static>;

/// DOM operation errors
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// Structural violation (cycle, wrong child kind, second document element)
    ///
    /// This is the invalid-operation case for tree mutations;
    /// [`DomError::InvalidOperation`] is reserved for writer state errors.
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    /// Node, attribute or key not present where required
    #[error("Not found: {0}")]
    NotFound(String),

    /// Handle belongs to another document
    #[error("Node belongs to a different document")]
    WrongDocument,

    /// Mutation of a sealed collection, read-only value or sealed settings
    #[error("Read-only: {0}")]
    ReadOnly(String),

    /// Argument validation failed before any state change
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A typed value rejected its raw input
    #[error("Invalid value {value:?}: {reason}")]
    InvalidValue { value: String, reason: String },

    /// Child position past the end of the child list
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attribute node already owned by another element
    #[error("Attribute is already in use by another element")]
    InUse,

    /// Operation not available for this node kind
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Call made in a state that does not allow it
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// One or more observers failed during a single dispatch
    #[error(transparent)]
    Observers(#[from] AggregateError),
}

impl DomError {
    pub(crate) fn hierarchy(message: impl Into<String>) -> Self {
        Self::HierarchyRequest(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn read_only(message: impl Into<String>) -> Self {
        Self::ReadOnly(message.into())
    }

    /// Structural violations: hierarchy, foreign node, unsupported kind
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::HierarchyRequest(_) | Self::WrongDocument | Self::NotSupported(_)
        )
    }
}

/// Errors collected from every observer that failed in one dispatch
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<ObserverError>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error, flattening nested aggregates
    pub fn push(&mut self, error: ObserverError) {
        match error.downcast::<AggregateError>() {
            Ok(nested) => {
                let nested = *nested;
                self.errors.extend(nested.errors);
            }
            Err(error) => self.errors.push(error),
        }
    }

    pub fn extend(&mut self, other: AggregateError) {
        self.errors.extend(other.errors);
    }

    pub fn errors(&self) -> &[ObserverError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ObserverError> {
        self.errors
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> DomResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomError::Observers(self))
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} observer(s) failed", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_flattens_nested() {
        let mut inner = AggregateError::new();
        inner.push("first".into());
        inner.push("second".into());

        let mut outer = AggregateError::new();
        outer.push(Box::new(inner));
        outer.push("third".into());

        assert_eq!(outer.len(), 3);
        assert_eq!(outer.errors()[2].to_string(), "third");
    }

    #[test]
    fn test_empty_aggregate_is_ok() {
        assert!(AggregateError::new().into_result().is_ok());

        let mut failed = AggregateError::new();
        failed.push("boom".into());
        let err = failed.into_result().unwrap_err();
        assert!(matches!(err, DomError::Observers(ref agg) if agg.len() == 1));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_structural_classification() {
        assert!(DomError::hierarchy("cycle").is_structural());
        assert!(DomError::WrongDocument.is_structural());
        assert!(!DomError::not_found("x").is_structural());
    }
}
