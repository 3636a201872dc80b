//! Error types for the injection container.
//!
//! Every failure raised by the container itself is a [`BindingError`]: a stable
//! [`ErrorKind`] plus an ordered list of `(name, value)` diagnostic tags. Errors
//! reported by host-supplied producers travel separately as
//! [`InjectError::Producer`] so callers get the producer's own error back.

use std::fmt;
use std::sync::Arc;

use crate::key::Key;

/// Closed set of failure kinds raised by the container.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::ErrorKind;
///
/// assert_eq!(ErrorKind::NoBinding.as_str(), "NoBinding");
/// assert_eq!(ErrorKind::AlreadyBound.to_string(), "AlreadyBound");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A builder was finalized without any key to bind
    Nil,
    /// A value could not be viewed as the type it was declared with
    TypeUnavailable,
    /// The key's type shape cannot be bound this way
    NotSupportedYet,
    /// Candidate type is not the key's type
    NotAssignable,
    /// Candidate does not implement the key's interface
    DoesNotImplement,
    /// Constructor does not return exactly a value and an error
    ConstructorReturnValuesInvalid,
    /// Candidate is not callable
    NotFunction,
    /// Tagged constructor parameters are not a record of injectable fields
    TaggedParametersInvalid,
    /// No binding exists for the requested key
    NoBinding,
    /// An alias chain never reaches a value-producing binding
    NoFinalBinding,
    /// The key is already bound in the graph
    AlreadyBound,
    /// An empty tag was supplied
    TagEmpty,
    /// One or more declaration errors collected from a module
    AggregateDeclarationErrors,
    /// The key (transitively) depends on itself
    CyclicBinding,
}

impl ErrorKind {
    /// Stable identifier for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Nil => "Nil",
            ErrorKind::TypeUnavailable => "TypeUnavailable",
            ErrorKind::NotSupportedYet => "NotSupportedYet",
            ErrorKind::NotAssignable => "NotAssignable",
            ErrorKind::DoesNotImplement => "DoesNotImplement",
            ErrorKind::ConstructorReturnValuesInvalid => "ConstructorReturnValuesInvalid",
            ErrorKind::NotFunction => "NotFunction",
            ErrorKind::TaggedParametersInvalid => "TaggedParametersInvalid",
            ErrorKind::NoBinding => "NoBinding",
            ErrorKind::NoFinalBinding => "NoFinalBinding",
            ErrorKind::AlreadyBound => "AlreadyBound",
            ErrorKind::TagEmpty => "TagEmpty",
            ErrorKind::AggregateDeclarationErrors => "AggregateDeclarationErrors",
            ErrorKind::CyclicBinding => "CyclicBinding",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container failure: kind, diagnostic tags and, for aggregates, the
/// collected inner errors.
///
/// Rendered as `inject: <kind> tags{k1:v1 k2:v2}`.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{BindingError, ErrorKind};
///
/// let err = BindingError::new(ErrorKind::NotAssignable)
///     .tag("key", "app::Config")
///     .tag("type", "app::Settings");
///
/// assert_eq!(err.kind(), ErrorKind::NotAssignable);
/// assert_eq!(err.tag_value("type"), Some("app::Settings"));
/// assert_eq!(
///     err.to_string(),
///     "inject: NotAssignable tags{key:app::Config type:app::Settings}"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    kind: ErrorKind,
    tags: Vec<(String, String)>,
    errors: Vec<BindingError>,
}

impl BindingError {
    /// Creates an error of the given kind with no tags.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            tags: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Collects declaration errors into one `AggregateDeclarationErrors`.
    pub fn aggregate(errors: Vec<BindingError>) -> Self {
        let count = errors.len();
        Self {
            kind: ErrorKind::AggregateDeclarationErrors,
            tags: vec![("count".to_string(), count.to_string())],
            errors,
        }
    }

    /// Appends a diagnostic tag.
    pub fn tag(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.tags.push((name.into(), value.to_string()));
        self
    }

    /// Appends the offending binding key as the `key` tag.
    pub fn key(self, key: &Key) -> Self {
        self.tag("key", key)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Value of the first tag with the given name.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Inner errors of an aggregate; empty for every other kind.
    pub fn errors(&self) -> &[BindingError] {
        &self.errors
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inject: {} tags{{", self.kind)?;
        for (i, (name, value)) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{}", name, value)?;
        }
        f.write_str("}")?;
        if !self.errors.is_empty() {
            f.write_str(" errors[")?;
            for (i, inner) in self.errors.iter().enumerate() {
                if i > 0 {
                    f.write_str("; ")?;
                }
                write!(f, "{}", inner)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl std::error::Error for BindingError {}

/// Error returned by injector construction and every query.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Injector, Resolver, ErrorKind};
///
/// let injector = Injector::new(Vec::new()).unwrap();
/// let err = injector.get::<String>().unwrap_err();
/// assert_eq!(err.kind(), Some(ErrorKind::NoBinding));
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum InjectError {
    /// Raised by the container itself
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// Reported by a host-supplied producer, carried unchanged
    #[error(transparent)]
    Producer(Arc<dyn std::error::Error + Send + Sync>),
}

impl InjectError {
    /// Wraps a producer's error without altering it.
    ///
    /// A producer that itself forwards an `InjectError` gets that error back
    /// as-is rather than nested inside `Producer`.
    pub fn from_producer<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let boxed: Box<dyn std::error::Error + Send + Sync> = err.into();
        match boxed.downcast::<InjectError>() {
            Ok(inner) => *inner,
            Err(other) => InjectError::Producer(Arc::from(other)),
        }
    }

    /// Kind of a container error; `None` for producer errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            InjectError::Binding(err) => Some(err.kind()),
            InjectError::Producer(_) => None,
        }
    }

    pub fn as_binding(&self) -> Option<&BindingError> {
        match self {
            InjectError::Binding(err) => Some(err),
            InjectError::Producer(_) => None,
        }
    }

    /// The producer's own error, for downcasting.
    pub fn producer_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            InjectError::Producer(err) => Some(err.as_ref()),
            InjectError::Binding(_) => None,
        }
    }
}

/// Result type for injection operations.
pub type InjectResult<T> = Result<T, InjectError>;
