//! HTTP API layer for safenet.
//!
//! - **Endpoints**: report intake, tracking, admin and provider workflows
//! - **Extractors**: session user, client address
//! - **Middleware**: session authentication, rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::{app, router};
pub use middleware::{AppState, SESSION_COOKIE};
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimitGroup, RateLimiterState};
