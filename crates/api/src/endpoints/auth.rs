//! Authentication and account endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::{DateTime, Utc};
use safenet_common::AppResult;
use safenet_core::{ChangePasswordInput, RegisterProviderInput};
use safenet_db::entities::{organization, user, user::Role};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientIp, SessionToken},
    middleware::{AppState, SESSION_COOKIE},
    response::ApiResponse,
};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response; the token is also set as the session cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: user::Model,
}

/// Registration response.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub organization: organization::Model,
    pub user: user::Model,
}

async fn login(
    state: &AppState,
    jar: CookieJar,
    role: Role,
    client_ip: &ClientIp,
    req: LoginRequest,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let outcome = state
        .account_service
        .login(role, &req.username, &req.password, client_ip.as_deref())
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, outcome.session.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.security.cookie_secure)
        .path("/");

    Ok((
        jar.add(cookie),
        ApiResponse::ok(LoginResponse {
            token: outcome.session.token,
            expires_at: outcome.session.expires_at.with_timezone(&Utc),
            user: outcome.user,
        }),
    ))
}

async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    client_ip: ClientIp,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    login(&state, jar, Role::Admin, &client_ip, req).await
}

async fn provider_login(
    State(state): State<AppState>,
    jar: CookieJar,
    client_ip: ClientIp,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    login(&state, jar, Role::Provider, &client_ip, req).await
}

/// End the current session and clear the cookie.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
    client_ip: ClientIp,
    SessionToken(token): SessionToken,
) -> AppResult<impl IntoResponse> {
    state
        .account_service
        .logout(&token, user.id, client_ip.as_deref())
        .await?;

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    ))
}

async fn register_provider(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(input): Json<RegisterProviderInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let (organization, user) = state
        .account_service
        .register_provider(input, client_ip.as_deref())
        .await?;
    Ok(ApiResponse::created(RegisterResponse { organization, user }))
}

async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<StatusCode> {
    state
        .account_service
        .change_password(user.id, input, client_ip.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin-login", post(admin_login))
        .route("/provider-login", post(provider_login))
        .route("/logout", post(logout))
        .route("/register_provider", post(register_provider))
        .route("/account/password", post(change_password))
}
