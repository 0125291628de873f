//! Session lifetime definitions.

use std::fmt;

/// Session lifetimes controlling how a data-access session is shared
///
/// Every [`Session`](crate::Session) handed out by a
/// [`ScopeManager`](crate::ScopeManager) is tagged with the lifetime it was
/// created under.
///
/// # Examples
///
/// ```rust
/// use ferrous_session::{factory_fn, Lifetime, ScopeManager};
///
/// struct Context;
///
/// let manager = ScopeManager::new(factory_fn(|| Ok::<_, std::io::Error>(Context)));
///
/// // Singleton: one instance for the whole manager
/// let shared = manager.get_or_create_singleton().unwrap();
/// assert_eq!(shared.lifetime(), Lifetime::Singleton);
///
/// // Scoped: one instance per scope key
/// let scoped = manager.get_or_create_for_scope("req-1").unwrap();
/// assert_eq!(scoped.lifetime(), Lifetime::Scoped);
///
/// // Transient: a fresh instance released when the guard drops
/// let transient = manager.create_transient().unwrap();
/// assert_eq!(transient.lifetime(), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per manager, created on first demand
    ///
    /// Lives until the manager shuts down. No release operation is exposed
    /// to callers.
    Singleton,
    /// Single instance per scope key, released when the scope ends
    Scoped,
    /// New instance per unit of work, released when its guard drops
    Transient,
}

impl Lifetime {
    /// Short lowercase label used in log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
