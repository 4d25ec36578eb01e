//! Error types for the dependency-resolution runtime.

use std::fmt;

use thiserror::Error;

/// One missing registration edge found by build-time validation.
///
/// Produced by [`ServiceCollection::build_with`](crate::ServiceCollection::build_with)
/// when `validate_on_build` is set: `dependent` declares a dependency on
/// `dependency`, but no descriptor is registered for `dependency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLink {
    /// Display name of the service declaring the dependency.
    pub dependent: String,
    /// Display name of the unregistered dependency token.
    pub dependency: String,
}

impl fmt::Display for MissingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.dependent, self.dependency)
    }
}

fn render_links(links: &[MissingLink]) -> String {
    links
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Dependency-resolution errors.
///
/// All variants are raised synchronously at the point of detection and
/// propagate up through the call chain; none are retried automatically.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get_required::<String>() {
///     Err(DiError::NotFound(name)) => assert!(name.contains("String")),
///     other => panic!("expected NotFound, got {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// The requested token (or a transitively required dependency token) has
    /// no registered descriptor.
    #[error("service not found: {0}")]
    NotFound(String),

    /// Build-time validation found unregistered dependency tokens. Every
    /// missing edge across the whole registry is aggregated into one error.
    #[error("build validation failed, missing registrations: {}", render_links(.0))]
    BuildValidation(Vec<MissingLink>),

    /// A descriptor carries neither an implementation constructor, a factory,
    /// nor a fixed value.
    #[error("descriptor for {0} has no constructor, factory, or value")]
    InvalidDescriptor(String),

    /// A scoped service was resolved from the root, or captured by a
    /// root-level/singleton construction, while scope validation is enabled.
    #[error("scope violation: {0}")]
    ScopeViolation(String),

    /// A `get*` call was issued after `dispose()`.
    #[error("resolver has been disposed")]
    Disposed,

    /// A service reference was read before its construction cycle finished
    /// wiring. Either resolve it deferred or restructure the eager access.
    #[error("{0} is still under construction and not yet wired")]
    NotWired(String),

    /// A token was found on the resolution stack with no partial instance
    /// recorded. This indicates a resolver bug, never a user error.
    #[error("{0} is on the resolution stack but has no partial instance")]
    MissingPartial(String),

    /// Type downcast failed while unwrapping a resolved instance.
    #[error("type mismatch for {0}")]
    TypeMismatch(&'static str),
}

/// Result type for resolution operations.
pub type DiResult<T> = Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_validation_lists_every_edge() {
        let err = DiError::BuildValidation(vec![
            MissingLink {
                dependent: "A".into(),
                dependency: "B".into(),
            },
            MissingLink {
                dependent: "C".into(),
                dependency: "D".into(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("A -> B"));
        assert!(msg.contains("C -> D"));
    }
}
