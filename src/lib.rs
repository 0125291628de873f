//! # ferrous-session
//!
//! Lifetime strategies for data-access sessions (ORM contexts, units of
//! work, connection handles).
//!
//! ## Features
//!
//! - **Three lifetimes**: transient, process-wide singleton and per-scope
//! - **Exactly-once singletons**: concurrent first access constructs one
//!   session; a failed construction is retried by the next caller
//! - **Explicit scope keys**: per-request sessions are keyed by a caller
//!   supplied [`ScopeKey`], so scoping works outside any web framework
//! - **Guaranteed release**: RAII guards release sessions on every exit path
//! - **Thread-safe**: managers are `Arc`-backed and can be shared freely
//! - **Observable**: lifecycle observers, `tracing` events and counters
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_session::{factory_fn, ScopeManager};
//!
//! struct Westwind {
//!     orders: Vec<(String, u32)>,
//! }
//!
//! let manager = ScopeManager::new(factory_fn(|| {
//!     Ok::<_, std::io::Error>(Westwind {
//!         orders: vec![("Ann".to_string(), 30), ("Bob".to_string(), 10)],
//!     })
//! }));
//!
//! // Transient: one session per unit of work, released afterwards
//! let cheapest = manager
//!     .with_transient(|db| db.orders.iter().map(|(_, total)| *total).min())
//!     .unwrap();
//! assert_eq!(cheapest, Some(10));
//!
//! // Singleton: the same session for every caller
//! let a = manager.get_or_create_singleton().unwrap();
//! let b = manager.get_or_create_singleton().unwrap();
//! assert_eq!(a, b);
//!
//! // Per-scope: one session per key until the scope ends
//! let scope = manager.enter_scope("req-1").unwrap();
//! let s1 = scope.session().unwrap();
//! assert_eq!(s1, scope.session().unwrap());
//! drop(scope);
//! assert!(s1.is_released());
//! ```
//!
//! ## Session Lifetimes
//!
//! - **Singleton**: Created once and shared until the manager shuts down
//! - **Scoped**: Created once per scope key (ideal for web request contexts)
//! - **Transient**: Created fresh for every unit of work
//!
//! ## Custom Factories
//!
//! ```rust
//! use ferrous_session::{BoxError, ScopeError, ScopeManager, SessionFactory};
//!
//! struct Unreachable;
//!
//! impl SessionFactory for Unreachable {
//!     type Context = ();
//!
//!     fn create(&self) -> Result<(), BoxError> {
//!         Err("connection refused".into())
//!     }
//! }
//!
//! let manager = ScopeManager::new(Unreachable);
//! let err = manager.get_or_create_singleton().unwrap_err();
//! assert!(matches!(err, ScopeError::SessionConstructionFailed { .. }));
//! assert_eq!(err.to_string(), "Session construction failed: connection refused");
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod manager;
pub mod metrics;
pub mod observer;
pub mod session;
pub mod traits;

#[cfg(feature = "axum-integration")]
pub mod axum_integration;

// Re-export core types
pub use config::ScopeConfig;
pub use error::{BoxError, ScopeError, ScopeResult};
pub use key::ScopeKey;
pub use lifetime::Lifetime;
pub use manager::{ScopeGuard, ScopeManager, ScopeManagerBuilder, TransientSession};
pub use metrics::MetricsSnapshot;
pub use observer::{LoggingObserver, ScopeObserver};
pub use session::{Session, SessionId};
pub use traits::{factory_fn, FnFactory, SessionFactory};
