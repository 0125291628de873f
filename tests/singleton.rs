use ferrous_session::{factory_fn, BoxError, Lifetime, ScopeError, ScopeManager, SessionFactory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_singleton_is_shared() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let manager = ScopeManager::new(factory_fn(move || {
        let n = counter_clone.fetch_add(1, Ordering::SeqCst) + 1;
        Ok::<_, BoxError>(format!("context-{}", n))
    }));

    let first = manager.get_or_create_singleton().unwrap();
    let second = manager.get_or_create_singleton().unwrap();
    let third = manager.clone().get_or_create_singleton().unwrap();

    assert_eq!(first, second);
    assert!(ferrous_session::Session::ptr_eq(&first, &third));
    assert_eq!(first.as_str(), "context-1");
    assert_eq!(first.lifetime(), Lifetime::Singleton);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_singleton_independent_of_scopes() {
    let manager = ScopeManager::new(factory_fn(|| Ok::<_, BoxError>(())));

    let shared = manager.get_or_create_singleton().unwrap();
    let scoped = manager.get_or_create_for_scope("req-1").unwrap();
    manager.end_scope("req-1");

    assert_ne!(shared, scoped);
    assert!(!shared.is_released());
    assert_eq!(manager.get_or_create_singleton().unwrap(), shared);
}

#[test]
fn test_failed_singleton_construction_is_retried() {
    struct FlakyFactory {
        attempts: AtomicUsize,
    }

    impl SessionFactory for FlakyFactory {
        type Context = usize;

        fn create(&self) -> Result<usize, BoxError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt == 1 {
                Err("database offline".into())
            } else {
                Ok(attempt)
            }
        }
    }

    let manager = ScopeManager::new(FlakyFactory { attempts: AtomicUsize::new(0) });

    let err = manager.get_or_create_singleton().unwrap_err();
    assert!(matches!(err, ScopeError::SessionConstructionFailed { .. }));
    assert!(err.to_string().contains("database offline"));

    let session = manager.get_or_create_singleton().unwrap();
    assert_eq!(*session.context(), 2);

    // Third call reuses, no new attempt
    let again = manager.get_or_create_singleton().unwrap();
    assert_eq!(again, session);
    assert_eq!(manager.factory().attempts.load(Ordering::SeqCst), 2);

    let stats = manager.metrics();
    assert_eq!(stats.construction_failures, 1);
    assert_eq!(stats.singleton_constructions, 1);
}

#[test]
fn test_separate_managers_have_separate_singletons() {
    let factory = Arc::new(factory_fn(|| Ok::<_, BoxError>(0u8)));
    let a = ScopeManager::new(factory.clone());
    let b = ScopeManager::new(factory);

    assert!(!ScopeManager::ptr_eq(&a, &b));
    assert_ne!(a.get_or_create_singleton().unwrap(), b.get_or_create_singleton().unwrap());
}
