//! Lifecycle observers for session scope traceability.
//!
//! Observers receive an event for every construction, reuse and release a
//! [`ScopeManager`](crate::ScopeManager) performs. They are called
//! synchronously on the thread doing the work, so implementations should be
//! light.

use std::sync::Arc;

use crate::{Lifetime, ScopeError, ScopeKey, SessionId};

/// Observer trait for session lifecycle events.
///
/// Every method has an empty default body; implement only what you need.
///
/// # Examples
///
/// ```
/// use ferrous_session::{factory_fn, Lifetime, ScopeManager, ScopeObserver, ScopeKey, SessionId};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct CountingObserver { created: AtomicUsize }
///
/// impl ScopeObserver for CountingObserver {
///     fn session_created(&self, _id: SessionId, _lifetime: Lifetime, _key: Option<&ScopeKey>) {
///         self.created.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let manager = ScopeManager::builder(factory_fn(|| Ok::<_, std::io::Error>(())))
///     .observer(observer.clone())
///     .build();
///
/// manager.get_or_create_for_scope("req-1").unwrap();
/// manager.get_or_create_for_scope("req-1").unwrap();
/// assert_eq!(observer.created.load(Ordering::SeqCst), 1);
/// ```
pub trait ScopeObserver: Send + Sync {
    /// A new session was constructed.
    ///
    /// `key` is set for scoped sessions only.
    fn session_created(&self, _id: SessionId, _lifetime: Lifetime, _key: Option<&ScopeKey>) {}

    /// An existing scoped session was handed out again.
    fn session_reused(&self, _id: SessionId, _key: &ScopeKey) {}

    /// A session's release hook ran.
    fn session_released(&self, _id: SessionId, _lifetime: Lifetime, _key: Option<&ScopeKey>) {}

    /// The factory failed to construct a session.
    fn construction_failed(&self, _lifetime: Lifetime, _key: Option<&ScopeKey>, _error: &ScopeError) {}

    /// The manager was shut down; `open_scopes` were still active.
    fn shutdown(&self, _open_scopes: usize) {}
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ScopeObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ScopeObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn session_created(&self, id: SessionId, lifetime: Lifetime, key: Option<&ScopeKey>) {
        for observer in &self.observers {
            observer.session_created(id, lifetime, key);
        }
    }

    #[inline]
    pub(crate) fn session_reused(&self, id: SessionId, key: &ScopeKey) {
        for observer in &self.observers {
            observer.session_reused(id, key);
        }
    }

    #[inline]
    pub(crate) fn session_released(&self, id: SessionId, lifetime: Lifetime, key: Option<&ScopeKey>) {
        for observer in &self.observers {
            observer.session_released(id, lifetime, key);
        }
    }

    #[inline]
    pub(crate) fn construction_failed(&self, lifetime: Lifetime, key: Option<&ScopeKey>, error: &ScopeError) {
        for observer in &self.observers {
            observer.construction_failed(lifetime, key, error);
        }
    }

    pub(crate) fn shutdown(&self, open_scopes: usize) {
        for observer in &self.observers {
            observer.shutdown(open_scopes);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Constructions and releases are logged at `info`, reuses at `trace`,
/// failures at `warn`. Install one with
/// [`ScopeManagerBuilder::observer`](crate::ScopeManagerBuilder::observer) or
/// by setting [`ScopeConfig::log_events`](crate::ScopeConfig).
///
/// ```
/// use ferrous_session::{factory_fn, LoggingObserver, ScopeManager};
/// use std::sync::Arc;
///
/// let manager = ScopeManager::builder(factory_fn(|| Ok::<_, std::io::Error>(())))
///     .observer(Arc::new(LoggingObserver::with_prefix("[orders-db]")))
///     .build();
/// # drop(manager);
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-session]".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Prefix prepended to every message.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn key_label(key: Option<&ScopeKey>) -> &str {
    key.map(ScopeKey::as_str).unwrap_or("-")
}

impl ScopeObserver for LoggingObserver {
    fn session_created(&self, id: SessionId, lifetime: Lifetime, key: Option<&ScopeKey>) {
        tracing::info!(
            session = id.get(),
            lifetime = lifetime.as_str(),
            scope = key_label(key),
            "{} Created {}", self.prefix, id
        );
    }

    fn session_reused(&self, id: SessionId, key: &ScopeKey) {
        tracing::trace!(session = id.get(), scope = key.as_str(), "{} Reused {}", self.prefix, id);
    }

    fn session_released(&self, id: SessionId, lifetime: Lifetime, key: Option<&ScopeKey>) {
        tracing::info!(
            session = id.get(),
            lifetime = lifetime.as_str(),
            scope = key_label(key),
            "{} Released {}", self.prefix, id
        );
    }

    fn construction_failed(&self, lifetime: Lifetime, key: Option<&ScopeKey>, error: &ScopeError) {
        tracing::warn!(
            lifetime = lifetime.as_str(),
            scope = key_label(key),
            "{} {}", self.prefix, error
        );
    }

    fn shutdown(&self, open_scopes: usize) {
        tracing::info!(open_scopes, "{} Shut down", self.prefix);
    }
}
