use ferrous_session::{factory_fn, BoxError, Lifetime, ScopeError, ScopeManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Tracker {
    created: AtomicUsize,
    released: AtomicUsize,
}

fn tracked_manager() -> (Arc<Tracker>, ScopeManager<impl ferrous_session::SessionFactory<Context = usize>>) {
    let tracker = Arc::new(Tracker {
        created: AtomicUsize::new(0),
        released: AtomicUsize::new(0),
    });
    let on_create = tracker.clone();
    let on_release = tracker.clone();

    let factory = factory_fn(move || Ok::<_, BoxError>(on_create.created.fetch_add(1, Ordering::SeqCst)))
        .on_release(move |_: &usize| {
            on_release.released.fetch_add(1, Ordering::SeqCst);
        });
    (tracker, ScopeManager::new(factory))
}

#[test]
fn test_transient_always_distinct() {
    let (tracker, manager) = tracked_manager();

    let a = manager.create_transient().unwrap();
    let b = manager.create_transient().unwrap();

    assert_ne!(*a, *b);
    assert_ne!(a.id(), b.id());
    assert_eq!(a.lifetime(), Lifetime::Transient);
    assert_eq!(tracker.created.load(Ordering::SeqCst), 2);
    assert_eq!(manager.active_scopes(), 0);
}

#[test]
fn test_transient_released_on_drop() {
    let (tracker, manager) = tracked_manager();

    let handle = {
        let session = manager.create_transient().unwrap();
        assert_eq!(tracker.released.load(Ordering::SeqCst), 0);
        session.handle()
    };

    assert!(handle.is_released());
    assert_eq!(tracker.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_explicit_release() {
    let (tracker, manager) = tracked_manager();

    let session = manager.create_transient().unwrap();
    let handle = session.handle();
    session.release();

    assert!(handle.is_released());
    assert_eq!(tracker.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_released_on_error_path() {
    let (tracker, manager) = tracked_manager();

    fn unit_of_work<F: ferrous_session::SessionFactory<Context = usize>>(
        manager: &ScopeManager<F>,
    ) -> Result<usize, String> {
        let session = manager.create_transient().map_err(|e| e.to_string())?;
        if **session == 0 {
            return Err("first order missing".to_string());
        }
        Ok(**session)
    }

    assert!(unit_of_work(&manager).is_err());
    assert_eq!(unit_of_work(&manager), Ok(1));
    assert_eq!(tracker.released.load(Ordering::SeqCst), 2);
}

#[test]
fn test_transient_released_on_panic() {
    let (tracker, manager) = tracked_manager();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        manager.with_transient(|_session| panic!("query failed")).ok();
    }));

    assert!(result.is_err());
    assert_eq!(tracker.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_with_transient_returns_work_result() {
    let (tracker, manager) = tracked_manager();

    let doubled = manager.with_transient(|session| **session * 2 + 10).unwrap();
    assert_eq!(doubled, 10);
    assert_eq!(tracker.released.load(Ordering::SeqCst), 1);
    assert_eq!(manager.metrics().transient_constructions, 1);
}

#[test]
fn test_transient_construction_failure() {
    let manager = ScopeManager::new(factory_fn(|| Err::<(), _>("no connection string")));

    let err = manager.create_transient().unwrap_err();
    assert!(matches!(err, ScopeError::SessionConstructionFailed { .. }));
    assert!(manager.with_transient(|_| ()).is_err());
    assert_eq!(manager.metrics().construction_failures, 2);
}
