//! Session handles.
//!
//! A [`Session`] wraps the context produced by a
//! [`SessionFactory`](crate::SessionFactory) together with the bookkeeping the
//! manager needs: a process-unique identity, the lifetime it was created
//! under, and a released flag guaranteeing the release hook runs only once.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::Lifetime;
use crate::traits::SessionFactory;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique session identity, for equality and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Shared handle to a data-access session.
///
/// Handles are cheap to clone; all clones refer to the same session and
/// compare equal. The wrapped context is reachable through `Deref` or
/// [`Session::context`].
///
/// # Examples
///
/// ```rust
/// use ferrous_session::{factory_fn, ScopeManager};
///
/// struct OrderContext { orders: Vec<u32> }
///
/// let manager = ScopeManager::new(factory_fn(|| {
///     Ok::<_, std::io::Error>(OrderContext { orders: vec![10, 20] })
/// }));
///
/// let a = manager.get_or_create_for_scope("req-1").unwrap();
/// let b = manager.get_or_create_for_scope("req-1").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.orders.len(), 2);
/// ```
pub struct Session<C> {
    inner: Arc<SessionInner<C>>,
}

struct SessionInner<C> {
    id: SessionId,
    lifetime: Lifetime,
    released: AtomicBool,
    context: C,
}

impl<C> Session<C> {
    pub(crate) fn new(context: C, lifetime: Lifetime) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: SessionId::next(),
                lifetime,
                released: AtomicBool::new(false),
                context,
            }),
        }
    }

    /// Identity of this session.
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Lifetime this session was created under.
    pub fn lifetime(&self) -> Lifetime {
        self.inner.lifetime
    }

    /// The collaborator-owned context.
    pub fn context(&self) -> &C {
        &self.inner.context
    }

    /// True once the release hook has run for this session.
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Returns true if both handles refer to the same session.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Runs the factory's release hook unless it already ran.
    ///
    /// Returns true if this call performed the release.
    pub(crate) fn release_with<F>(&self, factory: &F) -> bool
    where
        F: SessionFactory<Context = C>,
    {
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        factory.release(&self.inner.context);
        true
    }
}

impl<C> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C> PartialEq for Session<C> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<C> Eq for Session<C> {}

impl<C> Deref for Session<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner.context
    }
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("lifetime", &self.inner.lifetime)
            .field("released", &self.is_released())
            .finish()
    }
}
