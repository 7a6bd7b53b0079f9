//! Transport credential storage.
//!
//! Stores the access/refresh pair as two named, HttpOnly cookies with
//! independent lifetimes. The middleware and handlers read and write through
//! this module without caring that the backing transport is cookie-based.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the short-lived access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie name for the long-lived refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Cookie construction policy, fixed at startup from config.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub access_max_age_minutes: i64,
    pub refresh_max_age_minutes: i64,
}

impl CookieSettings {
    pub fn new(secure: bool, access_max_age_minutes: i64, refresh_max_age_minutes: i64) -> Self {
        Self {
            secure,
            access_max_age_minutes,
            refresh_max_age_minutes,
        }
    }

    fn build(&self, name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(max_age)
            .build()
    }

    /// Adds (or replaces) both auth cookies on the jar.
    pub fn set_auth_cookies(
        &self,
        jar: CookieJar,
        access_token: String,
        refresh_token: String,
    ) -> CookieJar {
        jar.add(self.build(
            ACCESS_COOKIE,
            access_token,
            Duration::minutes(self.access_max_age_minutes),
        ))
        .add(self.build(
            REFRESH_COOKIE,
            refresh_token,
            Duration::minutes(self.refresh_max_age_minutes),
        ))
    }

    /// Expires both auth cookies immediately.
    pub fn clear_auth_cookies(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.build(ACCESS_COOKIE, String::new(), Duration::ZERO))
            .add(self.build(REFRESH_COOKIE, String::new(), Duration::ZERO))
    }
}

/// Reads the stored access token, if any.
pub fn access_token(jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_COOKIE).map(|c| c.value().to_string())
}

/// Reads the stored refresh token, if any.
pub fn refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE).map(|c| c.value().to_string())
}
