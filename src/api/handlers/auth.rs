use crate::{
    auth::{cookies, middleware},
    types::{
        AppError, ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest,
        RegisterRequest, ResetPasswordRequest, Result, User,
    },
    AppState,
};
use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::AuthUser;

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = User),
        (status = 400, description = "Invalid username or password"),
        (status = 409, description = "Username already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<User>> {
    let user = state.auth_service.register(payload).await?;
    Ok(Json(user))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let response = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    let jar = state.cookies.set_auth_cookies(
        jar,
        response.access_token.clone(),
        response.refresh_token.clone(),
    );

    Ok((jar, Json(response)))
}

/// Exchange a refresh token for a new pair. The token comes from the request
/// body if present, otherwise from the refresh cookie.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let token = payload
        .refresh_token
        .or_else(|| cookies::refresh_token(&jar))
        .ok_or_else(|| AppError::Unauthorized("refresh token required".to_string()))?;

    let response = state.auth_service.refresh(&token).await?;

    let jar = state.cookies.set_auth_cookies(
        jar,
        response.access_token.clone(),
        response.refresh_token.clone(),
    );

    Ok((jar, Json(response)))
}

/// Logout: clears both auth cookies. Tokens stay valid until expiry (there is
/// no revocation store), so the cleared cookies are the whole effect.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    if let Some(token) = middleware::bearer_token(&headers).or_else(|| cookies::access_token(&jar))
    {
        state.auth_service.logout(&token).await;
    }

    let jar = state.cookies.clear_auth_cookies(jar);
    Ok((jar, Json(serde_json::json!({ "message": "logged out" }))))
}

/// Current user, re-fetched from the store so the response reflects changes
/// made since the token was issued.
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<User>> {
    let user = state.user_service.get_user(identity.id).await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .user_service
        .change_password(identity.id, payload)
        .await?;
    Ok(Json(serde_json::json!({ "message": "password changed" })))
}

/// Accepts a reset request. The response is identical whether or not the
/// username exists.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    state
        .user_service
        .request_password_reset(&payload.username)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "if the account exists, reset instructions have been sent"
    })))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
