/// Environment-driven configuration tests
///
/// These mutate process environment variables and therefore run serially.

use ferrous_session::{config::DEFAULT_ENV_PREFIX, factory_fn, BoxError, ScopeConfig, ScopeError, ScopeManager};
use serial_test::serial;
use std::env;

fn clear(prefix: &str) {
    for name in ["MAX_ACTIVE_SCOPES", "RELEASE_SINGLETON_ON_SHUTDOWN", "LOG_EVENTS"] {
        env::remove_var(format!("{}_{}", prefix, name));
    }
}

#[test]
#[serial]
fn test_defaults_when_unset() {
    clear(DEFAULT_ENV_PREFIX);
    let config = ScopeConfig::from_env().unwrap();
    assert_eq!(config, ScopeConfig::default());
}

#[test]
#[serial]
fn test_reads_default_prefix() {
    clear(DEFAULT_ENV_PREFIX);
    env::set_var("SESSION_SCOPE_MAX_ACTIVE_SCOPES", "64");
    env::set_var("SESSION_SCOPE_RELEASE_SINGLETON_ON_SHUTDOWN", "false");
    env::set_var("SESSION_SCOPE_LOG_EVENTS", "on");

    let config = ScopeConfig::from_env().unwrap();
    clear(DEFAULT_ENV_PREFIX);

    assert_eq!(config.max_active_scopes, Some(64));
    assert!(!config.release_singleton_on_shutdown);
    assert!(config.log_events);
}

#[test]
#[serial]
fn test_custom_prefix_is_uppercased() {
    clear("ORDERS_DB");
    env::set_var("ORDERS_DB_MAX_ACTIVE_SCOPES", "2");

    let config = ScopeConfig::from_env_with_prefix("orders_db").unwrap();
    clear("ORDERS_DB");

    assert_eq!(config.max_active_scopes, Some(2));
    let manager = ScopeManager::with_config(factory_fn(|| Ok::<_, BoxError>(())), config);
    manager.get_or_create_for_scope("a").unwrap();
    manager.get_or_create_for_scope("b").unwrap();
    assert!(manager.get_or_create_for_scope("c").is_err());
}

#[test]
#[serial]
fn test_invalid_values_are_reported() {
    clear(DEFAULT_ENV_PREFIX);
    env::set_var("SESSION_SCOPE_MAX_ACTIVE_SCOPES", "lots");

    let err = ScopeConfig::from_env().unwrap_err();
    clear(DEFAULT_ENV_PREFIX);

    assert!(matches!(err, ScopeError::InvalidConfig(_)));
    assert!(err.to_string().contains("MAX_ACTIVE_SCOPES"));
}
