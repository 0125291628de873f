/// Unit tests for ScopeKey validation and conversions

use ferrous_session::{ScopeError, ScopeKey};
use std::collections::HashMap;

#[test]
fn test_key_accepts_non_empty() {
    let key = ScopeKey::new("req-1").unwrap();
    assert_eq!(key.as_str(), "req-1");
    assert_eq!(key.to_string(), "req-1");
    assert_eq!(format!("{:?}", key), "ScopeKey(\"req-1\")");
}

#[test]
fn test_key_rejects_empty_and_blank() {
    for raw in ["", " ", "\t", "\r\n"] {
        assert!(matches!(ScopeKey::new(raw), Err(ScopeError::InvalidScopeKey)), "{:?}", raw);
    }
}

#[test]
fn test_key_try_from() {
    let from_str = ScopeKey::try_from("abc").unwrap();
    let from_string = ScopeKey::try_from(String::from("abc")).unwrap();
    assert_eq!(from_str, from_string);
    assert!(ScopeKey::try_from(String::new()).is_err());
}

#[test]
fn test_key_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(ScopeKey::new("req-9").unwrap(), 9);
    assert_eq!(map.get("req-9"), Some(&9));
    assert_eq!(map.get("req-8"), None);
}

#[test]
fn test_unique_keys_do_not_collide() {
    let keys: std::collections::HashSet<_> = (0..1000).map(|_| ScopeKey::unique()).collect();
    assert_eq!(keys.len(), 1000);
}

#[test]
fn test_key_clone_is_equal() {
    let key = ScopeKey::new("tenant/req").unwrap();
    let clone = key.clone();
    assert_eq!(key, clone);
    assert_eq!(key.as_ref(), "tenant/req");
}
