use ferrous_session::{factory_fn, BoxError, ScopeConfig, ScopeError, ScopeManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn manager_with_counter(config: ScopeConfig) -> (Arc<AtomicUsize>, ScopeManager<impl ferrous_session::SessionFactory<Context = ()>>) {
    let released = Arc::new(AtomicUsize::new(0));
    let counter = released.clone();
    let factory = factory_fn(|| Ok::<_, BoxError>(())).on_release(move |_: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (released, ScopeManager::with_config(factory, config))
}

#[test]
fn test_shutdown_releases_open_scopes_and_singleton() {
    let (released, manager) = manager_with_counter(ScopeConfig::default());

    let singleton = manager.get_or_create_singleton().unwrap();
    let a = manager.get_or_create_for_scope("a").unwrap();
    let b = manager.get_or_create_for_scope("b").unwrap();

    manager.shutdown();

    assert!(manager.is_shut_down());
    assert!(a.is_released() && b.is_released() && singleton.is_released());
    assert_eq!(released.load(Ordering::SeqCst), 3);
    assert_eq!(manager.active_scopes(), 0);
}

#[test]
fn test_shutdown_can_keep_singleton() {
    let (released, manager) =
        manager_with_counter(ScopeConfig::default().with_release_singleton_on_shutdown(false));

    let singleton = manager.get_or_create_singleton().unwrap();
    manager.shutdown();

    assert!(!singleton.is_released());
    assert_eq!(released.load(Ordering::SeqCst), 0);
}

#[test]
fn test_operations_after_shutdown() {
    let (_released, manager) = manager_with_counter(ScopeConfig::default());
    manager.shutdown();

    assert!(matches!(manager.get_or_create_singleton(), Err(ScopeError::ShutDown)));
    assert!(matches!(manager.get_or_create_for_scope("a"), Err(ScopeError::ShutDown)));
    assert!(matches!(manager.create_transient(), Err(ScopeError::ShutDown)));
    assert!(matches!(manager.enter_scope("a"), Err(ScopeError::ShutDown)));
    assert!(matches!(manager.begin_scope(), Err(ScopeError::ShutDown)));

    // Still a no-op, never an error
    assert!(!manager.end_scope("a"));
}

#[test]
fn test_shutdown_is_idempotent() {
    let (released, manager) = manager_with_counter(ScopeConfig::default());
    manager.get_or_create_for_scope("a").unwrap();

    manager.shutdown();
    manager.shutdown();

    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(manager.metrics().scopes_ended, 1);
}

#[test]
fn test_dropping_last_handle_tears_down() {
    let (released, manager) = manager_with_counter(ScopeConfig::default());

    let leaked = manager.get_or_create_for_scope("never-ended").unwrap();
    let singleton = manager.get_or_create_singleton().unwrap();
    let clone = manager.clone();

    drop(manager);
    assert_eq!(released.load(Ordering::SeqCst), 0);

    drop(clone);
    assert!(leaked.is_released());
    assert!(singleton.is_released());
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn test_guard_outliving_shutdown_is_harmless() {
    let (released, manager) = manager_with_counter(ScopeConfig::default());

    let scope = manager.enter_scope("late").unwrap();
    scope.session().unwrap();
    manager.shutdown();

    assert!(matches!(scope.session(), Err(ScopeError::ShutDown)));
    drop(scope);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

/// Manager whose factory signals `started` and then takes 100 ms.
fn slow_manager() -> (
    Arc<Barrier>,
    Arc<AtomicUsize>,
    Arc<AtomicUsize>,
    ScopeManager<impl ferrous_session::SessionFactory<Context = ()>>,
) {
    let started = Arc::new(Barrier::new(2));
    let created = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));

    let (gate, made, freed) = (started.clone(), created.clone(), released.clone());
    let factory = factory_fn(move || {
        made.fetch_add(1, Ordering::SeqCst);
        gate.wait();
        thread::sleep(Duration::from_millis(100));
        Ok::<_, BoxError>(())
    })
    .on_release(move |_: &()| {
        freed.fetch_add(1, Ordering::SeqCst);
    });

    (started, created, released, ScopeManager::new(factory))
}

#[test]
fn test_shutdown_during_scoped_construction() {
    let (started, created, released, manager) = slow_manager();

    let worker = {
        let manager = manager.clone();
        thread::spawn(move || manager.get_or_create_for_scope("k"))
    };

    started.wait();
    manager.shutdown();
    let result = worker.join().unwrap();

    assert!(matches!(result, Err(ScopeError::ShutDown)));
    assert_eq!(manager.active_scopes(), 0);
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_during_singleton_construction() {
    let (started, created, released, manager) = slow_manager();

    let worker = {
        let manager = manager.clone();
        thread::spawn(move || manager.get_or_create_singleton())
    };

    started.wait();
    manager.shutdown();
    let result = worker.join().unwrap();

    assert!(matches!(result, Err(ScopeError::ShutDown)));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(matches!(manager.get_or_create_singleton(), Err(ScopeError::ShutDown)));
}
