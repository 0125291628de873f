//! Per-scope session registry.
//!
//! Each key maps to a shared `OnceCell` slot. The map lock is held only to
//! find or insert a slot; construction runs on the slot itself, so callers
//! racing on the same key wait for a single construction while other keys
//! proceed independently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::{ScopeError, ScopeKey, ScopeResult, Session};

#[cfg(feature = "ahash")]
type RegistryHasher = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
type RegistryHasher = std::collections::hash_map::RandomState;

pub(crate) type Slot<C> = Arc<OnceCell<Session<C>>>;

/// Outcome of a registry lookup.
pub(crate) enum Acquired<C> {
    Created(Session<C>),
    Reused(Session<C>),
}

pub(crate) struct ScopeRegistry<C> {
    entries: Mutex<HashMap<ScopeKey, Slot<C>, RegistryHasher>>,
}

impl<C> ScopeRegistry<C> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::with_hasher(RegistryHasher::default())),
        }
    }

    /// Returns the session for `key`, constructing it with `create` if the
    /// key has none.
    ///
    /// A slot can be evicted while its session is being built (a failed
    /// construction, a concurrent `end_scope` or a shutdown). A session
    /// built into an evicted slot is handed to `discard` and the lookup
    /// starts over, unless `shut_down` has been set in the meantime.
    pub(crate) fn get_or_create<M, D>(
        &self,
        key: &ScopeKey,
        limit: Option<usize>,
        shut_down: &AtomicBool,
        create: M,
        discard: D,
    ) -> ScopeResult<Acquired<C>>
    where
        M: Fn() -> ScopeResult<Session<C>>,
        D: Fn(&Session<C>),
    {
        loop {
            let slot = self.slot_for(key, limit, shut_down)?;

            let mut created = false;
            let result = slot.get_or_try_init(|| {
                created = true;
                create()
            });

            match result {
                Ok(session) => {
                    let session = session.clone();
                    if self.is_current(key, &slot) {
                        return Ok(if created {
                            Acquired::Created(session)
                        } else {
                            Acquired::Reused(session)
                        });
                    }
                    if created {
                        discard(&session);
                    }
                }
                Err(err) => {
                    self.remove_if_empty(key, &slot);
                    return Err(err);
                }
            }
        }
    }

    // The flag is read under the map lock: teardown sets it before draining,
    // so no slot can be inserted after the drain.
    fn slot_for(&self, key: &ScopeKey, limit: Option<usize>, shut_down: &AtomicBool) -> ScopeResult<Slot<C>> {
        let mut entries = self.entries.lock();
        if shut_down.load(Ordering::Acquire) {
            return Err(ScopeError::ShutDown);
        }
        if let Some(slot) = entries.get(key) {
            return Ok(slot.clone());
        }
        if let Some(limit) = limit {
            if entries.len() >= limit {
                return Err(ScopeError::ScopeLimitReached { limit });
            }
        }
        let slot: Slot<C> = Arc::new(OnceCell::new());
        entries.insert(key.clone(), slot.clone());
        Ok(slot)
    }

    fn is_current(&self, key: &ScopeKey, slot: &Slot<C>) -> bool {
        self.entries
            .lock()
            .get(key)
            .map_or(false, |current| Arc::ptr_eq(current, slot))
    }

    fn remove_if_empty(&self, key: &ScopeKey, slot: &Slot<C>) {
        let mut entries = self.entries.lock();
        let stale = entries
            .get(key)
            .map_or(false, |current| Arc::ptr_eq(current, slot) && current.get().is_none());
        if stale {
            entries.remove(key);
        }
    }

    /// Removes the entry for `key`, returning it if one existed.
    pub(crate) fn remove(&self, key: &str) -> Option<(ScopeKey, Slot<C>)> {
        self.entries.lock().remove_entry(key)
    }

    /// Removes every entry.
    pub(crate) fn drain(&self) -> Vec<(ScopeKey, Slot<C>)> {
        self.entries.lock().drain().collect()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Session<C>> {
        self.entries.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn keys(&self) -> Vec<ScopeKey> {
        self.entries.lock().keys().cloned().collect()
    }
}
