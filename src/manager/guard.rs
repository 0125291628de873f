//! RAII guards tying a session or a scope to a lexical block.

use std::fmt;
use std::ops::Deref;

use super::ScopeManager;
use crate::traits::SessionFactory;
use crate::{ScopeKey, ScopeResult, Session};

/// A transient session released when the guard is dropped.
///
/// Dereferences to the [`Session`], so the context is reachable directly.
///
/// ```
/// use ferrous_session::{factory_fn, ScopeManager};
///
/// let manager = ScopeManager::new(factory_fn(|| Ok::<_, std::io::Error>(String::from("westwind"))));
///
/// let handle = {
///     let session = manager.create_transient().unwrap();
///     assert_eq!(session.as_str(), "westwind");
///     session.handle()
/// };
/// assert!(handle.is_released());
/// ```
pub struct TransientSession<F: SessionFactory> {
    session: Session<F::Context>,
    manager: ScopeManager<F>,
}

impl<F: SessionFactory> TransientSession<F> {
    pub(super) fn new(session: Session<F::Context>, manager: ScopeManager<F>) -> Self {
        Self { session, manager }
    }

    /// Another handle to the same session.
    ///
    /// The handle does not extend the session's lifetime: it observes
    /// [`Session::is_released`] once the guard drops.
    pub fn handle(&self) -> Session<F::Context> {
        self.session.clone()
    }

    /// Releases the session now instead of at the end of the block.
    pub fn release(self) {
        drop(self);
    }
}

impl<F: SessionFactory> Deref for TransientSession<F> {
    type Target = Session<F::Context>;

    fn deref(&self) -> &Session<F::Context> {
        &self.session
    }
}

impl<F: SessionFactory> Drop for TransientSession<F> {
    fn drop(&mut self) {
        self.manager.release(&self.session, None);
    }
}

impl<F: SessionFactory> fmt::Debug for TransientSession<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransientSession").field(&self.session).finish()
    }
}

/// An open scope, ended when the guard is dropped.
///
/// Dropping the guard calls [`ScopeManager::end_scope`] for its key, also
/// when the enclosing code returns early or unwinds.
///
/// ```
/// use ferrous_session::{factory_fn, ScopeManager};
///
/// let manager = ScopeManager::new(factory_fn(|| Ok::<_, std::io::Error>(())));
///
/// {
///     let scope = manager.enter_scope("req-42").unwrap();
///     let a = scope.session().unwrap();
///     let b = scope.session().unwrap();
///     assert_eq!(a, b);
///     assert!(manager.contains_scope("req-42"));
/// }
/// assert!(!manager.contains_scope("req-42"));
/// ```
pub struct ScopeGuard<F: SessionFactory> {
    key: ScopeKey,
    manager: ScopeManager<F>,
}

impl<F: SessionFactory> ScopeGuard<F> {
    pub(super) fn new(key: ScopeKey, manager: ScopeManager<F>) -> Self {
        Self { key, manager }
    }

    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    /// The session of this scope, constructed on first call.
    pub fn session(&self) -> ScopeResult<Session<F::Context>> {
        self.manager.get_or_create_for_scope(&self.key)
    }

    pub fn manager(&self) -> &ScopeManager<F> {
        &self.manager
    }

    /// Ends the scope now.
    pub fn end(self) {
        drop(self);
    }
}

impl<F: SessionFactory> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        self.manager.end_scope(&self.key);
    }
}

impl<F: SessionFactory> fmt::Debug for ScopeGuard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard").field("key", &self.key).finish()
    }
}
