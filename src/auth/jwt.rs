use crate::types::{AppError, Claims, Result, TokenKind, User};
use crate::utils::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Issuer claim pinned on every token this service signs.
pub const ISSUER: &str = "aegis-server";
/// Audience claim pinned on every token this service signs.
pub const AUDIENCE: &str = "aegis-users";

/// Token service issuing and validating signed, typed, expiring JWTs.
///
/// Access and refresh tokens are signed with distinct secrets and carry an
/// embedded [`TokenKind`] discriminator, so a leaked refresh secret cannot
/// forge an access token and a long-lived refresh token cannot be replayed
/// where a short-lived access token is expected.
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_expiry: i64,
    refresh_expiry: i64,
}

impl TokenService {
    /// Creates a new TokenService.
    ///
    /// # Arguments
    /// * `access_secret` - Secret for signing access tokens (at least 32 chars)
    /// * `refresh_secret` - Secret for signing refresh tokens, distinct from
    ///   the access secret
    /// * `access_expiry` - Access token validity in minutes
    /// * `refresh_expiry` - Refresh token validity in minutes
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_expiry: i64,
        refresh_expiry: i64,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_expiry,
            refresh_expiry,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.access_secret.clone(),
            config.refresh_secret.clone(),
            config.access_expiry_minutes,
            config.refresh_expiry_minutes,
        )
    }

    /// Access token lifetime in minutes, echoed as `expires_in` by the auth
    /// endpoints.
    pub fn access_expiry_minutes(&self) -> i64 {
        self.access_expiry
    }

    /// Issues a short-lived access token for the user.
    pub fn issue_access(&self, user: &User) -> Result<String> {
        self.issue(user, TokenKind::Access)
    }

    /// Issues a long-lived refresh token for the user.
    pub fn issue_refresh(&self, user: &User) -> Result<String> {
        self.issue(user, TokenKind::Refresh)
    }

    fn issue(&self, user: &User, kind: TokenKind) -> Result<String> {
        let now = Utc::now();
        let expiry = match kind {
            TokenKind::Access => self.access_expiry,
            TokenKind::Refresh => self.refresh_expiry,
        };

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user.id.to_string(),
            aud: AUDIENCE.to_string(),
            exp: (now + Duration::minutes(expiry)).timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            username: user.username.clone(),
            role: user.role,
            token_kind: kind,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_for(kind).as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verifies signature, algorithm, expiry, not-before, issuer, audience and
    /// the embedded discriminator, and returns the typed claims.
    ///
    /// The secret is chosen by `expected` before decoding, so a token of the
    /// other class fails the signature check even before the discriminator is
    /// compared. Restricting the accepted algorithm to HS256 rejects
    /// algorithm-substitution tokens.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_for(expected).as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                AppError::InvalidToken("token not yet valid".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AppError::InvalidToken("invalid signature".to_string())
            }
            _ => AppError::InvalidToken(e.to_string()),
        })?;

        if data.claims.token_kind != expected {
            return Err(AppError::WrongTokenType { expected });
        }

        Ok(data.claims)
    }

    fn secret_for(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }
}
