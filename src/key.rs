//! Scope keys correlating a session with its owning scope.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::{ScopeError, ScopeResult};

/// Identifier of a logical scope (one request, one job, one conversation).
///
/// A key is never empty: construction through [`ScopeKey::new`] rejects
/// empty and whitespace-only strings with [`ScopeError::InvalidScopeKey`].
/// Cloning is cheap, the text is shared behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use ferrous_session::{ScopeKey, ScopeError};
///
/// let key = ScopeKey::new("req-1").unwrap();
/// assert_eq!(key.as_str(), "req-1");
///
/// assert!(matches!(ScopeKey::new("   "), Err(ScopeError::InvalidScopeKey)));
///
/// // Freshly minted keys never collide
/// assert_ne!(ScopeKey::unique(), ScopeKey::unique());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey(Arc<str>);

impl ScopeKey {
    /// Validates and wraps a caller-supplied key.
    pub fn new(key: impl AsRef<str>) -> ScopeResult<Self> {
        let key = key.as_ref();
        if key.trim().is_empty() {
            return Err(ScopeError::InvalidScopeKey);
        }
        Ok(Self(Arc::from(key)))
    }

    /// Mints a random key (UUID v4) for hosts that have no natural request id.
    pub fn unique() -> Self {
        Self(Arc::from(uuid::Uuid::new_v4().to_string()))
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ScopeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ScopeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeKey({:?})", &*self.0)
    }
}

impl TryFrom<&str> for ScopeKey {
    type Error = ScopeError;

    fn try_from(value: &str) -> ScopeResult<Self> {
        ScopeKey::new(value)
    }
}

impl TryFrom<String> for ScopeKey {
    type Error = ScopeError;

    fn try_from(value: String) -> ScopeResult<Self> {
        ScopeKey::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_keeps_surrounding_whitespace() {
        let key = ScopeKey::new(" req ").unwrap();
        assert_eq!(key.as_str(), " req ");
    }

    #[test]
    fn test_unique_keys_are_valid() {
        let key = ScopeKey::unique();
        assert!(ScopeKey::new(key.as_str()).is_ok());
        assert_eq!(key.as_str().len(), 36);
    }
}
