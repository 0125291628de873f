//! Core traits for session scope management.

mod factory;

pub use factory::{factory_fn, FnFactory, SessionFactory};
