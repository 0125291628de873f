//! Error types for session scope management.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Boxed error returned by a [`SessionFactory`](crate::SessionFactory) when
/// the data-access layer cannot produce a session context.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Scope management errors
///
/// Represents the conditions under which a [`ScopeManager`](crate::ScopeManager)
/// refuses to hand out a session.
///
/// # Examples
///
/// ```rust
/// use ferrous_session::ScopeError;
///
/// let invalid = ScopeError::InvalidScopeKey;
/// let limit = ScopeError::ScopeLimitReached { limit: 8 };
///
/// assert_eq!(invalid.to_string(), "Invalid scope key: key must not be empty");
/// assert_eq!(limit.to_string(), "Scope limit reached: 8 scopes already active");
/// ```
#[derive(Debug, Clone)]
pub enum ScopeError {
    /// The data-access collaborator could not create a session
    SessionConstructionFailed {
        message: String,
        source: Option<Arc<dyn Error + Send + Sync + 'static>>,
    },
    /// An empty (or whitespace-only) scope key was supplied
    InvalidScopeKey,
    /// Opening another scope would exceed the configured registry capacity
    ScopeLimitReached { limit: usize },
    /// The manager has been shut down
    ShutDown,
    /// A configuration value could not be parsed
    InvalidConfig(String),
}

impl ScopeError {
    /// Wraps a factory failure, keeping the original error as the source.
    pub fn construction_failed(err: BoxError) -> Self {
        ScopeError::SessionConstructionFailed {
            message: err.to_string(),
            source: Some(Arc::from(err)),
        }
    }

    /// Builds a construction failure from a plain message.
    pub fn construction_message(message: impl Into<String>) -> Self {
        ScopeError::SessionConstructionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for [`ScopeError::SessionConstructionFailed`].
    pub fn is_construction_failure(&self) -> bool {
        matches!(self, ScopeError::SessionConstructionFailed { .. })
    }
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::SessionConstructionFailed { message, .. } => {
                write!(f, "Session construction failed: {}", message)
            }
            ScopeError::InvalidScopeKey => {
                write!(f, "Invalid scope key: key must not be empty")
            }
            ScopeError::ScopeLimitReached { limit } => {
                write!(f, "Scope limit reached: {} scopes already active", limit)
            }
            ScopeError::ShutDown => write!(f, "Scope manager has been shut down"),
            ScopeError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl Error for ScopeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScopeError::SessionConstructionFailed { source: Some(src), .. } => {
                Some(src.as_ref() as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}

/// Result type for scope operations
///
/// ```rust
/// use ferrous_session::{ScopeResult, ScopeError};
///
/// fn open() -> ScopeResult<()> {
///     Err(ScopeError::ShutDown)
/// }
///
/// assert!(open().is_err());
/// ```
pub type ScopeResult<T> = Result<T, ScopeError>;
