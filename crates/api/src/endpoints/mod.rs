//! API endpoints.

mod admin;
mod auth;
mod dashboard;
mod directory;
mod health;
mod provider;
mod reports;

use axum::{Router, middleware::from_fn_with_state};
use crate::{
    middleware::{AppState, auth_middleware},
    rate_limit::rate_limit_middleware,
};

/// Default page size for list endpoints.
const DEFAULT_LIMIT: u64 = 50;

/// Largest page size a client may request.
const MAX_LIMIT: u64 = 100;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(reports::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(directory::router())
        .merge(provider::router())
        .nest("/admin", admin::router())
}

/// The full application: routes plus session and rate limit middleware.
pub fn app(state: AppState) -> Router {
    router()
        .layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Pagination query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Page {
    fn limit(self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn offset(self) -> u64 {
        self.offset.unwrap_or(0)
    }
}
