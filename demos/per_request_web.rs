//! One session per HTTP request, shared by everything that handles it.
//!
//! Run with: `cargo run --example per_request_web --features axum-integration`
//! then `curl http://127.0.0.1:3000/customers`.

use axum::{routing::get, Json, Router};
use ferrous_session::axum_integration::{with_session_scopes, RequestScope, RequestSession};
use ferrous_session::{BoxError, ScopeManager, SessionFactory};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

struct WestwindEntities {
    connection: u64,
    customers: Vec<&'static str>,
}

#[derive(Default)]
struct WestwindFactory {
    opened: AtomicU64,
}

impl SessionFactory for WestwindFactory {
    type Context = WestwindEntities;

    fn create(&self) -> Result<WestwindEntities, BoxError> {
        let connection = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(WestwindEntities {
            connection,
            customers: vec!["Ann Devon", "Tom Hardy", "Liu Wong"],
        })
    }

    fn release(&self, context: &WestwindEntities) {
        tracing::info!(connection = context.connection, "context disposed");
    }
}

async fn list_customers(
    RequestSession(db): RequestSession<WestwindFactory>,
    axum::Extension(scope): axum::Extension<RequestScope<WestwindFactory>>,
) -> Json<Value> {
    // A second lookup inside the same request reuses the same session.
    let again = scope.session().map(|s| s == db).unwrap_or(false);
    Json(json!({
        "request_scope": scope.key().as_str(),
        "connection": db.connection,
        "same_session_within_request": again,
        "customers": db.customers,
    }))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let manager = ScopeManager::new(WestwindFactory::default());
    let app = with_session_scopes(Router::new().route("/customers", get(list_customers)), manager.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://127.0.0.1:3000/customers");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    manager.shutdown();
    Ok(())
}
