//! Lifecycle counters for a scope manager.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Lifetime;

/// Counters updated by a [`ScopeManager`](crate::ScopeManager).
#[derive(Debug, Default)]
pub(crate) struct ScopeMetrics {
    singleton_constructions: AtomicU64,
    scoped_constructions: AtomicU64,
    transient_constructions: AtomicU64,
    scoped_reuses: AtomicU64,
    releases: AtomicU64,
    construction_failures: AtomicU64,
    scopes_ended: AtomicU64,
}

impl ScopeMetrics {
    pub(crate) fn record_construction(&self, lifetime: Lifetime) {
        let counter = match lifetime {
            Lifetime::Singleton => &self.singleton_constructions,
            Lifetime::Scoped => &self.scoped_constructions,
            Lifetime::Transient => &self.transient_constructions,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reuse(&self) {
        self.scoped_reuses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.construction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scope_ended(&self) {
        self.scopes_ended.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, active_scopes: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            singleton_constructions: self.singleton_constructions.load(Ordering::Relaxed),
            scoped_constructions: self.scoped_constructions.load(Ordering::Relaxed),
            transient_constructions: self.transient_constructions.load(Ordering::Relaxed),
            scoped_reuses: self.scoped_reuses.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            construction_failures: self.construction_failures.load(Ordering::Relaxed),
            scopes_ended: self.scopes_ended.load(Ordering::Relaxed),
            active_scopes,
        }
    }
}

/// Point-in-time copy of a manager's counters.
///
/// ```
/// use ferrous_session::{factory_fn, ScopeManager};
///
/// let manager = ScopeManager::new(factory_fn(|| Ok::<_, std::io::Error>(())));
/// manager.get_or_create_for_scope("a").unwrap();
/// manager.get_or_create_for_scope("a").unwrap();
/// manager.end_scope("a");
///
/// let stats = manager.metrics();
/// assert_eq!(stats.scoped_constructions, 1);
/// assert_eq!(stats.scoped_reuses, 1);
/// assert_eq!(stats.scopes_ended, 1);
/// assert_eq!(stats.active_scopes, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub singleton_constructions: u64,
    pub scoped_constructions: u64,
    pub transient_constructions: u64,
    /// Scoped lookups served from the registry
    pub scoped_reuses: u64,
    /// Release hooks run, across all lifetimes
    pub releases: u64,
    pub construction_failures: u64,
    pub scopes_ended: u64,
    pub active_scopes: usize,
}

impl MetricsSnapshot {
    /// Total successful constructions across all lifetimes.
    pub fn total_constructions(&self) -> u64 {
        self.singleton_constructions + self.scoped_constructions + self.transient_constructions
    }
}
