//! API rate limiting middleware.
//!
//! Fixed-window counters keyed by route group and client address.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use safenet_common::{AppError, config::RateLimitSettings};
use tokio::sync::RwLock;

use crate::extractors::{ClientIp, client_ip};

/// Rate limit configuration for one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Create a new rate limit config.
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Rate limit state for a single key.
#[derive(Debug, Clone)]
struct RateLimitState {
    /// Request count in current window.
    count: u32,
    /// Window start time.
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }
}

/// API rate limiter.
#[derive(Clone)]
pub struct ApiRateLimiter {
    states: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl Default for ApiRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiRateLimiter {
    /// Create a new rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let window = Duration::from_secs(config.window_secs);

        let state = states
            .entry(key.to_string())
            .or_insert_with(RateLimitState::new);

        if now.duration_since(state.window_start) >= window {
            state.count = 0;
            state.window_start = now;
        }

        let reset = window
            .saturating_sub(now.duration_since(state.window_start))
            .as_secs();

        if state.count >= config.max_requests {
            return RateLimitResult::Limited {
                retry_after: reset.max(1),
                limit: config.max_requests,
            };
        }

        state.count += 1;
        RateLimitResult::Allowed {
            remaining: config.max_requests.saturating_sub(state.count),
            limit: config.max_requests,
            reset,
        }
    }

    /// Drop entries whose window ended long ago.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let max_window = Duration::from_secs(max_window_secs * 2);

        states.retain(|_, state| now.duration_since(state.window_start) < max_window);
    }

    /// Get the number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }
}

/// Rate limit check result.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until window reset.
        reset: u64,
    },
    Limited {
        retry_after: u64,
        limit: u32,
    },
}

/// Limiter plus the per-group limits, shared by the middleware.
#[derive(Clone)]
pub struct RateLimiterState {
    pub limiter: ApiRateLimiter,
    /// Anonymous report submission.
    pub report: RateLimitConfig,
    /// Admin and provider login.
    pub login: RateLimitConfig,
    /// Everything else.
    pub standard: RateLimitConfig,
    /// Key on proxy headers instead of the peer address.
    pub trust_proxy: bool,
}

impl RateLimiterState {
    #[must_use]
    pub fn new(settings: &RateLimitSettings, trust_proxy: bool) -> Self {
        Self {
            limiter: ApiRateLimiter::new(),
            report: RateLimitConfig::new(settings.report_per_hour, 3600),
            login: RateLimitConfig::new(settings.login_max, settings.login_window_secs),
            standard: RateLimitConfig::new(settings.standard_per_minute, 60),
            trust_proxy,
        }
    }

    /// Longest window of any group.
    #[must_use]
    pub fn max_window_secs(&self) -> u64 {
        self.report
            .window_secs
            .max(self.login.window_secs)
            .max(self.standard.window_secs)
    }
}

/// Route group a request is limited under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitGroup {
    Report,
    Login,
    Standard,
}

impl RateLimitGroup {
    /// Classify a request by method and path.
    #[must_use]
    pub fn classify(method: &Method, path: &str) -> Self {
        if *method != Method::POST {
            return Self::Standard;
        }
        match path {
            "/report" | "/api/reports" => Self::Report,
            "/admin-login" | "/provider-login" => Self::Login,
            _ => Self::Standard,
        }
    }

    const fn key_prefix(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Login => "login",
            Self::Standard => "standard",
        }
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let group = RateLimitGroup::classify(req.method(), req.uri().path());
    let config = match group {
        RateLimitGroup::Report => limiter.report,
        RateLimitGroup::Login => limiter.login,
        RateLimitGroup::Standard => limiter.standard,
    };
    rate_limit_with_config(
        &limiter.limiter,
        group.key_prefix(),
        &config,
        limiter.trust_proxy,
        req,
        next,
    )
    .await
}

async fn rate_limit_with_config(
    limiter: &ApiRateLimiter,
    group: &str,
    config: &RateLimitConfig,
    trust_proxy: bool,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(req.headers(), peer, trust_proxy);
    let key = match ip {
        Some(ip) => format!("{group}:{ip}"),
        None => format!("{group}:unknown"),
    };
    req.extensions_mut()
        .insert(ClientIp(ip.map(|ip| ip.to_string())));

    match limiter.check(&key, config).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", limit.into());
            headers.insert("x-ratelimit-remaining", remaining.into());
            headers.insert("x-ratelimit-reset", reset.into());

            Ok(response)
        }
        RateLimitResult::Limited { retry_after, .. } => {
            tracing::warn!(group, retry_after, "Rate limit exceeded");
            Err(AppError::RateLimited { retry_after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_rate_limiter_allows_requests() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(5, 60);

        for _ in 0..5 {
            assert!(matches!(
                limiter.check("report:203.0.113.7", &config).await,
                RateLimitResult::Allowed { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_api_rate_limiter_blocks_after_limit() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(3, 60);

        for _ in 0..3 {
            limiter.check("login:203.0.113.7", &config).await;
        }

        match limiter.check("login:203.0.113.7", &config).await {
            RateLimitResult::Limited { retry_after, limit } => {
                assert!(retry_after > 0);
                assert_eq!(limit, 3);
            }
            RateLimitResult::Allowed { .. } => panic!("Expected Limited"),
        }
    }

    #[tokio::test]
    async fn test_api_rate_limiter_separate_keys() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(2, 60);

        limiter.check("report:203.0.113.7", &config).await;
        limiter.check("report:203.0.113.7", &config).await;

        assert!(matches!(
            limiter.check("report:198.51.100.2", &config).await,
            RateLimitResult::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("login:203.0.113.7", &config).await,
            RateLimitResult::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_headers() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(10, 60);

        match limiter.check("test", &config).await {
            RateLimitResult::Allowed {
                remaining,
                limit,
                reset,
            } => {
                assert_eq!(limit, 10);
                assert_eq!(remaining, 9);
                assert!(reset <= 60);
            }
            RateLimitResult::Limited { .. } => panic!("Expected Allowed"),
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_windows() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(10, 60);

        limiter.check("a", &config).await;
        limiter.check("b", &config).await;
        limiter.cleanup(60).await;

        assert_eq!(limiter.key_count().await, 2);
    }

    #[test]
    fn test_classify_route_groups() {
        assert_eq!(
            RateLimitGroup::classify(&Method::POST, "/report"),
            RateLimitGroup::Report
        );
        assert_eq!(
            RateLimitGroup::classify(&Method::POST, "/api/reports"),
            RateLimitGroup::Report
        );
        assert_eq!(
            RateLimitGroup::classify(&Method::GET, "/report"),
            RateLimitGroup::Standard
        );
        assert_eq!(
            RateLimitGroup::classify(&Method::POST, "/provider-login"),
            RateLimitGroup::Login
        );
        assert_eq!(
            RateLimitGroup::classify(&Method::POST, "/api/reports/4/status"),
            RateLimitGroup::Standard
        );
    }

    #[test]
    fn test_limits_from_settings() {
        let state = RateLimiterState::new(&RateLimitSettings::default(), false);
        assert_eq!(state.report.window_secs, 3600);
        assert!(!state.trust_proxy);
        assert_eq!(state.max_window_secs(), 3600);
    }
}
