//! Axum web framework integration for ferrous-session.
//!
//! This module provides per-request session scoping for Axum 0.7:
//! - A middleware opening one scope per request and ending it when the
//!   response is produced, the handler fails, or the request future is dropped
//! - A [`RequestSession`] extractor returning the request's session
//! - A [`SharedSession`] extractor returning the process-wide session
//!
//! Scope keys are minted per request with [`ScopeKey::unique`]; client
//! supplied identifiers are never used, so concurrent requests cannot
//! collide.
//!
//! ```rust,ignore
//! let manager = ScopeManager::new(WestwindFactory::new());
//! let app = ferrous_session::axum_integration::with_session_scopes(
//!     Router::new().route("/customers", get(list_customers)),
//!     manager,
//! );
//!
//! async fn list_customers(RequestSession(db): RequestSession<WestwindFactory>) -> String {
//!     db.customers().join(", ")
//! }
//! ```

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::traits::SessionFactory;
use crate::{ScopeError, ScopeKey, ScopeManager, Session};

/// Request extension identifying the scope opened for the current request.
pub struct RequestScope<F: SessionFactory> {
    key: ScopeKey,
    manager: ScopeManager<F>,
}

impl<F: SessionFactory> RequestScope<F> {
    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    /// The request's session, constructed on first call.
    pub fn session(&self) -> Result<Session<F::Context>, ScopeRejection> {
        self.manager
            .get_or_create_for_scope(&self.key)
            .map_err(ScopeRejection::Scope)
    }
}

impl<F: SessionFactory> Clone for RequestScope<F> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            manager: self.manager.clone(),
        }
    }
}

/// Middleware body: one scope per request.
///
/// Install with [`with_session_scopes`] or
/// `axum::middleware::from_fn_with_state(manager, session_scope::<F>)`.
pub async fn session_scope<F: SessionFactory>(
    State(manager): State<ScopeManager<F>>,
    mut request: Request,
    next: Next,
) -> Response {
    let guard = match manager.begin_scope() {
        Ok(guard) => guard,
        Err(err) => return ScopeRejection::Scope(err).into_response(),
    };

    request.extensions_mut().insert(RequestScope {
        key: guard.key().clone(),
        manager: manager.clone(),
    });

    let response = next.run(request).await;
    tracing::trace!(scope = guard.key().as_str(), status = response.status().as_u16(), "request scope closing");
    drop(guard);
    response
}

/// Wraps every route of `router` in the per-request scope middleware.
pub fn with_session_scopes<F, S>(router: Router<S>, manager: ScopeManager<F>) -> Router<S>
where
    F: SessionFactory,
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(manager, session_scope::<F>))
}

/// Extractor for the current request's session
pub struct RequestSession<F: SessionFactory>(pub Session<F::Context>);

#[async_trait]
impl<S, F> FromRequestParts<S> for RequestSession<F>
where
    S: Send + Sync,
    F: SessionFactory,
{
    type Rejection = ScopeRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scope = parts
            .extensions
            .get::<RequestScope<F>>()
            .ok_or(ScopeRejection::MissingScope)?;
        scope.session().map(RequestSession)
    }
}

/// Extractor for the manager's singleton session.
///
/// Requires the [`RequestScope`] extension, i.e. the scope middleware.
pub struct SharedSession<F: SessionFactory>(pub Session<F::Context>);

#[async_trait]
impl<S, F> FromRequestParts<S> for SharedSession<F>
where
    S: Send + Sync,
    F: SessionFactory,
{
    type Rejection = ScopeRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scope = parts
            .extensions
            .get::<RequestScope<F>>()
            .ok_or(ScopeRejection::MissingScope)?;
        scope
            .manager
            .get_or_create_singleton()
            .map(SharedSession)
            .map_err(ScopeRejection::Scope)
    }
}

/// Rejection type for session extraction failures
#[derive(Debug)]
pub enum ScopeRejection {
    /// The scope middleware is not installed on this route
    MissingScope,
    Scope(ScopeError),
}

impl IntoResponse for ScopeRejection {
    fn into_response(self) -> Response {
        match self {
            ScopeRejection::MissingScope => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "request scope not found in extensions, install with_session_scopes()".to_string(),
            )
                .into_response(),
            ScopeRejection::Scope(err) => {
                let status = match err {
                    ScopeError::InvalidScopeKey | ScopeError::InvalidConfig(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    ScopeError::SessionConstructionFailed { .. }
                    | ScopeError::ScopeLimitReached { .. }
                    | ScopeError::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, err.to_string()).into_response()
            }
        }
    }
}
