//! # Aegis - user-management backend
//!
//! A user-management server built around a dual-token JWT scheme: a
//! short-lived access token authenticates requests, a long-lived refresh
//! token renews the session, and the middleware rotates an expired access
//! token mid-request without the client noticing. Roles (admin > manager >
//! user >= guest) gate the administration surface.
//!
//! ## Overview
//!
//! Aegis can be used in two ways:
//!
//! 1. **As a standalone server** - run the `aegis-server` binary
//! 2. **As a library** - mount the router or reuse the services in your own
//!    Axum application
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use aegis::{api::routes, db::StoreProvider, utils::config::Config, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = Arc::from(StoreProvider::Memory.create_store().await?);
//!
//!     let app = routes::create_router(AppState::new(config, store));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - dual-token JWT authentication and middleware
//! - [`db`] - user store abstraction (in-memory or file-backed SQLite)
//! - [`users`] - user administration service
//! - [`types`] - common types and error handling
//! - [`utils`] - configuration

/// HTTP API handlers and routes.
pub mod api;
/// Dual-token JWT authentication and middleware.
pub mod auth;
/// User store backends.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// User administration.
pub mod users;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthService, CookieSettings, TokenService};
pub use db::{StoreProvider, UserStore};
pub use types::{AppError, Result};
pub use users::UserService;
pub use utils::config::Config;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup
    pub config: Arc<Config>,
    /// User store backend
    pub store: Arc<dyn UserStore>,
    /// Token issuance and validation
    pub tokens: Arc<TokenService>,
    /// Authentication flows (login, register, refresh, logout)
    pub auth_service: Arc<AuthService>,
    /// User administration
    pub user_service: Arc<UserService>,
    /// Cookie construction policy
    pub cookies: CookieSettings,
}

impl AppState {
    /// Wires the services around a store and the loaded configuration.
    ///
    /// Cookie lifetimes track the token lifetimes so a cookie never outlives
    /// the token it carries.
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.jwt));
        let auth_service = Arc::new(AuthService::new(store.clone(), tokens.clone()));
        let user_service = Arc::new(UserService::new(store.clone()));
        let cookies = CookieSettings::new(
            config.cookies.secure,
            config.jwt.access_expiry_minutes,
            config.jwt.refresh_expiry_minutes,
        );

        Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            user_service,
            cookies,
        }
    }
}
