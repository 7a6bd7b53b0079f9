//! Dual-token authentication.
//!
//! The subsystem issues two JWTs per session: a short-lived access token
//! that authenticates individual requests and a long-lived refresh token
//! that can mint a replacement pair. Both travel as HttpOnly cookies (the
//! access token is also honored as a bearer header), and the middleware
//! renews an expired access token mid-request without the client noticing.
//!
//! # Module Structure
//!
//! - [`jwt`] - token issuance and validation, typed [`Claims`](crate::types::Claims)
//! - [`password`] - Argon2id hashing and verification
//! - [`service`] - login, register, refresh, and logout flows
//! - [`cookies`] - the cookie pair the tokens travel in
//! - [`middleware`] - the request gate, role gates, and the `AuthUser` extractor
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id (memory-hard) with per-password salts
//! - **Two signing secrets**: access and refresh tokens never cross-validate
//! - **Kind discriminator**: a claim marks each token's purpose, so even a
//!   shared secret cannot turn a refresh token into an access token
//! - **Enumeration-safe login**: unknown username and wrong password produce
//!   the same error

pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use cookies::CookieSettings;
pub use jwt::TokenService;
pub use middleware::{AuthGate, AuthUser};
pub use service::AuthService;
