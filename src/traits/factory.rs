//! The data-access collaborator seam.

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;

/// Produces and releases session contexts.
///
/// This is the boundary to the external data-access layer (an ORM, a
/// connection pool, a unit-of-work type). The manager never inspects the
/// context it produces; it only decides how long the context lives.
///
/// # Examples
///
/// ```
/// use ferrous_session::{BoxError, SessionFactory, ScopeManager};
///
/// struct Westwind { connection: String }
///
/// struct WestwindFactory { connection: String }
///
/// impl SessionFactory for WestwindFactory {
///     type Context = Westwind;
///
///     fn create(&self) -> Result<Westwind, BoxError> {
///         if self.connection.is_empty() {
///             return Err("missing connection string".into());
///         }
///         Ok(Westwind { connection: self.connection.clone() })
///     }
///
///     fn release(&self, context: &Westwind) {
///         println!("closing {}", context.connection);
///     }
/// }
///
/// let manager = ScopeManager::new(WestwindFactory { connection: "db://westwind".into() });
/// let session = manager.create_transient().unwrap();
/// assert_eq!(session.connection, "db://westwind");
/// ```
pub trait SessionFactory: Send + Sync + 'static {
    /// The collaborator-owned session state.
    type Context: Send + Sync + 'static;

    /// Constructs a new context.
    fn create(&self) -> Result<Self::Context, BoxError>;

    /// Releases a context at the end of its lifetime.
    ///
    /// Called at most once per session. The default does nothing; the
    /// context is dropped when the last handle to it goes away.
    fn release(&self, _context: &Self::Context) {}
}

impl<F: SessionFactory> SessionFactory for Arc<F> {
    type Context = F::Context;

    fn create(&self) -> Result<Self::Context, BoxError> {
        (**self).create()
    }

    fn release(&self, context: &Self::Context) {
        (**self).release(context)
    }
}

type ReleaseFn<C> = Arc<dyn Fn(&C) + Send + Sync>;

/// Closure-backed [`SessionFactory`], built with [`factory_fn`].
pub struct FnFactory<F, C> {
    create: F,
    release: Option<ReleaseFn<C>>,
}

/// Adapts a constructor closure into a [`SessionFactory`].
///
/// ```
/// use ferrous_session::{factory_fn, ScopeManager};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let released = Arc::new(AtomicUsize::new(0));
/// let counter = released.clone();
///
/// let factory = factory_fn(|| Ok::<_, std::io::Error>(vec![1u32, 2, 3]))
///     .on_release(move |_orders: &Vec<u32>| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
///
/// let manager = ScopeManager::new(factory);
/// manager.with_transient(|orders| assert_eq!(orders.len(), 3)).unwrap();
/// assert_eq!(released.load(Ordering::SeqCst), 1);
/// ```
pub fn factory_fn<F, C, E>(create: F) -> FnFactory<F, C>
where
    F: Fn() -> Result<C, E> + Send + Sync + 'static,
    C: Send + Sync + 'static,
    E: Into<BoxError>,
{
    FnFactory {
        create,
        release: None,
    }
}

impl<F, C> FnFactory<F, C> {
    /// Installs a release hook run when a session ends.
    pub fn on_release<R>(mut self, release: R) -> Self
    where
        R: Fn(&C) + Send + Sync + 'static,
    {
        self.release = Some(Arc::new(release));
        self
    }
}

impl<F, C, E> SessionFactory for FnFactory<F, C>
where
    F: Fn() -> Result<C, E> + Send + Sync + 'static,
    C: Send + Sync + 'static,
    E: Into<BoxError>,
{
    type Context = C;

    fn create(&self) -> Result<C, BoxError> {
        (self.create)().map_err(Into::into)
    }

    fn release(&self, context: &C) {
        if let Some(release) = &self.release {
            release(context);
        }
    }
}

impl<F, C> fmt::Debug for FnFactory<F, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory")
            .field("release_hook", &self.release.is_some())
            .finish()
    }
}
