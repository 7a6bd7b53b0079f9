//! HTTP API Handlers and Routes
//!
//! The REST surface of the server, built on Axum.
//!
//! # Module Structure
//!
//! - [`handlers`] - request handlers for each endpoint
//! - [`routes`] - route definitions and middleware layering
//!
//! # API Endpoints
//!
//! ## Public (`/api/auth`, `/api/health`)
//! - `POST /api/auth/register` - Register a new user
//! - `POST /api/auth/login` - Login and receive the token pair
//! - `POST /api/auth/refresh` - Exchange a refresh token for a new pair
//! - `POST /api/auth/reset-password` - Request a password reset
//! - `POST /api/auth/logout` - Clear auth cookies (best-effort, works with
//!   an expired or absent token)
//! - `GET /api/health` - Health check
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! ## Authenticated
//! - `GET /api/auth/me` - Current user
//! - `POST /api/auth/change-password` - Change own password
//!
//! ## Manager or admin
//! - `GET /api/users` - List users (managers see only user/guest accounts)
//! - `GET /api/users/{id}` - Fetch one user
//!
//! ## Admin only
//! - `POST /api/users` - Create a user
//! - `PUT /api/users/{id}` - Update a user
//! - `DELETE /api/users/{id}` - Delete a user
//! - `POST /api/users/{id}/activate` - Reactivate an account
//! - `POST /api/users/{id}/deactivate` - Deactivate an account
//!
//! # Authentication
//!
//! Protected endpoints accept the access token either as
//! `Authorization: Bearer <token>` or as the `access_token` cookie set at
//! login. An expired access token is renewed transparently when a valid
//! refresh cookie accompanies the request.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI document for the annotated endpoints, served at
/// `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::users::create_user,
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User administration endpoints")
    )
)]
pub struct ApiDoc;
