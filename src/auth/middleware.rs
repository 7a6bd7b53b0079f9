use crate::auth::cookies::{self, CookieSettings};
use crate::auth::jwt::TokenService;
use crate::auth::service::AuthService;
use crate::types::{AppError, AuthenticatedUser, Role, TokenKind};
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Everything the request gate needs, cloned into the middleware closure at
/// router construction.
#[derive(Clone)]
pub struct AuthGate {
    pub tokens: Arc<TokenService>,
    pub auth: Arc<AuthService>,
    pub cookies: CookieSettings,
}

/// Per-request authentication gate.
///
/// Extracts a token (Authorization header first, access cookie as fallback),
/// validates it as an access token and attaches the derived
/// [`AuthenticatedUser`] to the request extensions. An expired access token
/// triggers one transparent renewal attempt via the stored refresh token; on
/// success the request proceeds as if the original token had been valid and
/// the response carries the newly issued pair as replacement cookies
/// (sliding session). Every other failure is an immediate 401 with no
/// renewal attempt and no retry.
pub async fn require_auth(gate: AuthGate, mut req: Request, next: Next) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(req.headers());

    let token = bearer_token(req.headers())
        .or_else(|| cookies::access_token(&jar))
        .ok_or_else(|| AppError::Unauthorized("missing authentication token".to_string()))?;

    match gate.tokens.validate(&token, TokenKind::Access) {
        Ok(claims) => {
            let identity = claims.authenticated_user().map_err(|_| {
                AppError::Unauthorized("token contains invalid user information".to_string())
            })?;
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(AppError::TokenExpired) => {
            tracing::debug!("access token expired, attempting transparent renewal");
            renew_and_continue(gate, jar, req, next).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "token validation failed");
            Err(AppError::Unauthorized("invalid token".to_string()))
        }
    }
}

/// Completes the original request on the strength of the refresh token and
/// swaps the client's stored credentials for the newly issued pair.
async fn renew_and_continue(
    gate: AuthGate,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let refresh_token = cookies::refresh_token(&jar)
        .ok_or_else(|| AppError::Unauthorized("token expired".to_string()))?;

    let renewed = gate.auth.refresh(&refresh_token).await.map_err(|e| {
        tracing::debug!(error = %e, "transparent renewal failed");
        AppError::Unauthorized("token expired".to_string())
    })?;

    let identity = gate
        .tokens
        .validate(&renewed.access_token, TokenKind::Access)
        .and_then(|claims| claims.authenticated_user())
        .map_err(|e| {
            tracing::error!(error = %e, "freshly issued access token failed validation");
            AppError::Unauthorized("token expired".to_string())
        })?;

    tracing::info!(username = %identity.username, "session renewed transparently");
    req.extensions_mut().insert(identity);

    let response = next.run(req).await;
    let jar = gate
        .cookies
        .set_auth_cookies(jar, renewed.access_token, renewed.refresh_token);

    Ok((jar, response).into_response())
}

/// Role gate admitting exactly the given role. Trusts the identity attached
/// by [`require_auth`] earlier in the same request; never re-validates the
/// token.
pub async fn require_role(role: Role, req: Request, next: Next) -> Result<Response, AppError> {
    let identity = attached_identity(&req)?;

    if identity.role != role {
        return Err(AppError::Forbidden(format!("required role: {}", role)));
    }

    Ok(next.run(req).await)
}

/// Role gate admitting only admins.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(Role::Admin, req, next).await
}

/// Role gate admitting admins and managers.
pub async fn require_manager_or_higher(req: Request, next: Next) -> Result<Response, AppError> {
    let identity = attached_identity(&req)?;

    if !identity.role.is_manager_or_higher() {
        return Err(AppError::Forbidden(
            "required role: manager or admin".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

fn attached_identity(req: &Request) -> Result<&AuthenticatedUser, AppError> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("no authenticated identity".to_string()))
}

/// Pulls the token out of an `Authorization: Bearer` header, if present.
pub(crate) fn bearer_token(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

// ============= Extractor =============

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Extractor handing handlers the identity attached by [`require_auth`].
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("no authenticated identity".to_string()))
    }
}
