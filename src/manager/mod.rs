//! Scope manager: hands out sessions under the three lifetimes.
//!
//! Also contains the builder and the RAII guards returned by
//! [`ScopeManager::create_transient`] and [`ScopeManager::enter_scope`].

use std::fmt;
use std::sync::atomic::{self, AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::metrics::{MetricsSnapshot, ScopeMetrics};
use crate::observer::{LoggingObserver, Observers, ScopeObserver};
use crate::traits::SessionFactory;
use crate::{Lifetime, ScopeConfig, ScopeError, ScopeKey, ScopeResult, Session};

mod guard;
mod registry;

pub use guard::{ScopeGuard, TransientSession};
use registry::{Acquired, ScopeRegistry};

/// Shared, thread-safe owner of a session factory and its scope registry.
///
/// A `ScopeManager` is cheap to clone (it uses `Arc` internally); clones
/// share the singleton slot and the registry. Construct one at service
/// start, pass clones to whatever needs sessions, and call
/// [`shutdown`](Self::shutdown) (or drop the last clone) at teardown.
///
/// # Lifetime Behavior
///
/// - **Singleton**: [`get_or_create_singleton`](Self::get_or_create_singleton)
///   constructs one session on first demand and returns it forever after
/// - **Scoped**: [`get_or_create_for_scope`](Self::get_or_create_for_scope)
///   constructs one session per key; [`end_scope`](Self::end_scope) releases it
/// - **Transient**: [`create_transient`](Self::create_transient) constructs a
///   session owned by the caller and released when its guard drops
///
/// # Examples
///
/// ```
/// use ferrous_session::{factory_fn, ScopeManager};
///
/// struct Westwind;
///
/// let manager = ScopeManager::new(factory_fn(|| Ok::<_, std::io::Error>(Westwind)));
///
/// let s1 = manager.get_or_create_for_scope("req-1").unwrap();
/// let again = manager.get_or_create_for_scope("req-1").unwrap();
/// assert_eq!(s1, again);
///
/// assert!(manager.end_scope("req-1"));
/// let s2 = manager.get_or_create_for_scope("req-1").unwrap();
/// assert_ne!(s1, s2);
/// assert!(s1.is_released());
/// ```
pub struct ScopeManager<F: SessionFactory> {
    inner: Arc<ManagerInner<F>>,
}

struct ManagerInner<F: SessionFactory> {
    factory: F,
    config: ScopeConfig,
    singleton: OnceCell<Session<F::Context>>,
    registry: ScopeRegistry<F::Context>,
    observers: Observers,
    metrics: ScopeMetrics,
    shut_down: AtomicBool,
}

impl<F: SessionFactory> ScopeManager<F> {
    /// Creates a manager with default configuration and no observers.
    pub fn new(factory: F) -> Self {
        Self::builder(factory).build()
    }

    /// Creates a manager with the given configuration.
    pub fn with_config(factory: F, config: ScopeConfig) -> Self {
        Self::builder(factory).config(config).build()
    }

    /// Starts building a manager.
    pub fn builder(factory: F) -> ScopeManagerBuilder<F> {
        ScopeManagerBuilder {
            factory,
            config: ScopeConfig::default(),
            observers: Observers::new(),
        }
    }

    /// Returns the process-wide session, constructing it on first call.
    ///
    /// Concurrent first callers block until the single construction finishes
    /// and then all receive the same session. If construction fails the
    /// error is returned and the slot stays empty, so the next call tries
    /// again.
    ///
    /// A construction that finishes after [`shutdown`](Self::shutdown) has
    /// started is released (per [`ScopeConfig::release_singleton_on_shutdown`])
    /// and reported as [`ScopeError::ShutDown`].
    pub fn get_or_create_singleton(&self) -> ScopeResult<Session<F::Context>> {
        self.ensure_running()?;
        let inner = &*self.inner;
        let session = inner
            .singleton
            .get_or_try_init(|| {
                self.ensure_running()?;
                inner.construct(Lifetime::Singleton, None)
            })?
            .clone();

        // Pairs with the fence in teardown: either teardown sees the
        // initialized cell or this load sees the flag.
        atomic::fence(Ordering::SeqCst);
        if inner.shut_down.load(Ordering::SeqCst) {
            if inner.config.release_singleton_on_shutdown {
                inner.release(&session, None);
            }
            return Err(ScopeError::ShutDown);
        }
        Ok(session)
    }

    /// Returns the session of scope `key`, constructing it on first access.
    ///
    /// Fails with [`ScopeError::InvalidScopeKey`] for an empty key and with
    /// [`ScopeError::ScopeLimitReached`] when a new key would exceed
    /// [`ScopeConfig::max_active_scopes`]. Neither failure touches the
    /// registry.
    ///
    /// The session stays registered until [`end_scope`](Self::end_scope) is
    /// called for the same key.
    pub fn get_or_create_for_scope<K: AsRef<str>>(&self, key: K) -> ScopeResult<Session<F::Context>> {
        let key = ScopeKey::new(key)?;
        self.ensure_running()?;
        let inner = &*self.inner;

        let acquired = inner.registry.get_or_create(
            &key,
            inner.config.scope_limit(),
            &inner.shut_down,
            || inner.construct(Lifetime::Scoped, Some(&key)),
            |orphan| inner.release(orphan, Some(&key)),
        )?;

        match acquired {
            Acquired::Created(session) => Ok(session),
            Acquired::Reused(session) => {
                inner.metrics.record_reuse();
                tracing::debug!(session = session.id().get(), scope = key.as_str(), "session reused");
                inner.observers.session_reused(session.id(), &key);
                Ok(session)
            }
        }
    }

    /// Ends scope `key`: evicts its session and runs the release hook.
    ///
    /// Returns true if the key had an entry. Ending an unknown, already
    /// ended or empty key is a no-op.
    pub fn end_scope<K: AsRef<str>>(&self, key: K) -> bool {
        let inner = &*self.inner;
        let Some((key, slot)) = inner.registry.remove(key.as_ref()) else {
            return false;
        };

        inner.metrics.record_scope_ended();
        tracing::debug!(scope = key.as_str(), "scope ended");
        if let Some(session) = slot.get() {
            inner.release(session, Some(&key));
        }
        true
    }

    /// Constructs a session owned by the caller.
    ///
    /// The session is released when the returned guard drops, whether the
    /// unit of work returns normally, returns an error or unwinds.
    pub fn create_transient(&self) -> ScopeResult<TransientSession<F>> {
        self.ensure_running()?;
        let session = self.inner.construct(Lifetime::Transient, None)?;
        Ok(TransientSession::new(session, self.clone()))
    }

    /// Runs `work` with a fresh transient session and releases it afterwards.
    ///
    /// ```
    /// use ferrous_session::{factory_fn, ScopeManager};
    ///
    /// let manager = ScopeManager::new(factory_fn(|| Ok::<_, std::io::Error>(vec![3u32, 1, 2])));
    /// let total: u32 = manager.with_transient(|orders| orders.iter().sum()).unwrap();
    /// assert_eq!(total, 6);
    /// ```
    pub fn with_transient<R, W>(&self, work: W) -> ScopeResult<R>
    where
        W: FnOnce(&Session<F::Context>) -> R,
    {
        let session = self.create_transient()?;
        Ok(work(&session))
    }

    /// Opens scope `key` and returns a guard that ends it on drop.
    ///
    /// The session itself is still constructed lazily, on the first
    /// [`ScopeGuard::session`] call.
    pub fn enter_scope<K: AsRef<str>>(&self, key: K) -> ScopeResult<ScopeGuard<F>> {
        let key = ScopeKey::new(key)?;
        self.ensure_running()?;
        Ok(ScopeGuard::new(key, self.clone()))
    }

    /// Opens a scope under a freshly minted [`ScopeKey::unique`] key.
    pub fn begin_scope(&self) -> ScopeResult<ScopeGuard<F>> {
        self.ensure_running()?;
        Ok(ScopeGuard::new(ScopeKey::unique(), self.clone()))
    }

    /// Returns the session of scope `key` without constructing one.
    pub fn scoped_session<K: AsRef<str>>(&self, key: K) -> Option<Session<F::Context>> {
        self.inner.registry.get(key.as_ref())
    }

    /// Number of scopes currently holding a registry entry.
    pub fn active_scopes(&self) -> usize {
        self.inner.registry.len()
    }

    /// Keys of all open scopes, in no particular order.
    pub fn scope_keys(&self) -> Vec<ScopeKey> {
        self.inner.registry.keys()
    }

    pub fn contains_scope<K: AsRef<str>>(&self, key: K) -> bool {
        self.inner.registry.contains(key.as_ref())
    }

    /// Point-in-time copy of this manager's counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot(self.inner.registry.len())
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.inner.config
    }

    /// The session factory this manager draws from.
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    /// Tears the manager down.
    ///
    /// Ends every open scope, releases the singleton if
    /// [`ScopeConfig::release_singleton_on_shutdown`] is set, and makes all
    /// later acquisitions fail with [`ScopeError::ShutDown`]. Calling it
    /// again does nothing. Dropping the last clone of the manager performs
    /// the same teardown.
    pub fn shutdown(&self) {
        self.inner.teardown();
    }

    /// Returns true if both handles share the same manager state.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    fn ensure_running(&self) -> ScopeResult<()> {
        if self.is_shut_down() {
            return Err(ScopeError::ShutDown);
        }
        Ok(())
    }

    pub(crate) fn release(&self, session: &Session<F::Context>, key: Option<&ScopeKey>) {
        self.inner.release(session, key);
    }
}

impl<F: SessionFactory> ManagerInner<F> {
    fn construct(&self, lifetime: Lifetime, key: Option<&ScopeKey>) -> ScopeResult<Session<F::Context>> {
        match self.factory.create() {
            Ok(context) => {
                let session = Session::new(context, lifetime);
                self.metrics.record_construction(lifetime);
                tracing::debug!(
                    session = session.id().get(),
                    lifetime = lifetime.as_str(),
                    scope = key.map(ScopeKey::as_str),
                    "session created"
                );
                self.observers.session_created(session.id(), lifetime, key);
                Ok(session)
            }
            Err(err) => {
                let err = ScopeError::construction_failed(err);
                self.metrics.record_failure();
                tracing::warn!(
                    lifetime = lifetime.as_str(),
                    scope = key.map(ScopeKey::as_str),
                    error = %err,
                    "session construction failed"
                );
                self.observers.construction_failed(lifetime, key, &err);
                Err(err)
            }
        }
    }

    fn release(&self, session: &Session<F::Context>, key: Option<&ScopeKey>) {
        if !session.release_with(&self.factory) {
            return;
        }
        self.metrics.record_release();
        tracing::debug!(
            session = session.id().get(),
            lifetime = session.lifetime().as_str(),
            scope = key.map(ScopeKey::as_str),
            "session released"
        );
        self.observers.session_released(session.id(), session.lifetime(), key);
    }

    fn teardown(&self) {
        let first = !self.shut_down.swap(true, Ordering::SeqCst);
        atomic::fence(Ordering::SeqCst);

        let open = self.registry.drain();
        if first && !open.is_empty() {
            tracing::warn!(open_scopes = open.len(), "shutting down with open scopes");
        }
        let open_count = open.len();
        for (key, slot) in open {
            self.metrics.record_scope_ended();
            if let Some(session) = slot.get() {
                self.release(session, Some(&key));
            }
        }

        if self.config.release_singleton_on_shutdown {
            if let Some(session) = self.singleton.get() {
                self.release(session, None);
            }
        }

        if first {
            self.observers.shutdown(open_count);
        }
    }
}

impl<F: SessionFactory> Drop for ManagerInner<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<F: SessionFactory> Clone for ScopeManager<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: SessionFactory> fmt::Debug for ScopeManager<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeManager")
            .field("config", &self.inner.config)
            .field("singleton", &self.inner.singleton.get())
            .field("active_scopes", &self.inner.registry.len())
            .field("observers", &self.inner.observers.has_observers())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Builder for [`ScopeManager`].
///
/// ```
/// use ferrous_session::{factory_fn, LoggingObserver, ScopeConfig, ScopeManager};
/// use std::sync::Arc;
///
/// let manager = ScopeManager::builder(factory_fn(|| Ok::<_, std::io::Error>(())))
///     .config(ScopeConfig::default().with_max_active_scopes(256))
///     .observer(Arc::new(LoggingObserver::new()))
///     .build();
///
/// assert_eq!(manager.config().max_active_scopes, Some(256));
/// ```
pub struct ScopeManagerBuilder<F: SessionFactory> {
    factory: F,
    config: ScopeConfig,
    observers: Observers,
}

impl<F: SessionFactory> ScopeManagerBuilder<F> {
    pub fn config(mut self, config: ScopeConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an observer; observers are notified in registration order.
    pub fn observer(mut self, observer: Arc<dyn ScopeObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn build(self) -> ScopeManager<F> {
        let mut observers = self.observers;
        if self.config.log_events {
            observers.add(Arc::new(LoggingObserver::new()));
        }

        ScopeManager {
            inner: Arc::new(ManagerInner {
                factory: self.factory,
                config: self.config,
                singleton: OnceCell::new(),
                registry: ScopeRegistry::new(),
                observers,
                metrics: ScopeMetrics::default(),
                shut_down: AtomicBool::new(false),
            }),
        }
    }
}
