use crate::auth::jwt::TokenService;
use crate::auth::password;
use crate::db::UserStore;
use crate::types::{
    AppError, LoginResponse, RegisterRequest, Result, Role, TokenKind, User,
};
use chrono::Utc;
use std::sync::Arc;

/// Authentication orchestration: login, registration, token refresh, logout.
///
/// Stateless apart from the injected store and token service; every call is a
/// pure function of its inputs plus the store's current contents. There is no
/// server-side session record - token validity is signature + expiry +
/// discriminator alone.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Authenticates a user and returns a fresh access/refresh pair.
    ///
    /// Unknown usernames and wrong passwords both map to
    /// `InvalidCredentials`; the response never reveals which one it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::UserDeactivated);
        }

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access(&user)?;
        let refresh_token = self.tokens.issue_refresh(&user)?;

        // Best-effort: a failed last-login stamp never fails the login.
        if let Err(e) = self.store.record_last_login(user.id).await {
            tracing::warn!(username = %user.username, error = %e, "failed to record last login");
        }

        tracing::info!(username = %user.username, role = %user.role, "user logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
            expires_in: self.tokens.access_expiry_minutes(),
        })
    }

    /// Creates a new account. The role defaults to `user` when unset or
    /// unrecognised.
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        if req.username.len() < 3 {
            return Err(AppError::InvalidUsername);
        }
        if req.password.len() < 8 {
            return Err(AppError::PasswordTooShort);
        }

        if self.store.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: 0,
            username: req.username,
            password_hash: password::hash_password(&req.password)?,
            first_name: req.first_name,
            last_name: req.last_name,
            role: Role::from_name_or_default(req.role.as_deref()),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create(&user).await?;
        tracing::info!(username = %created.username, role = %created.role, "user registered");
        Ok(created)
    }

    /// Exchanges a valid refresh token for a new access/refresh pair.
    ///
    /// The user is re-fetched so role and active-status changes since
    /// issuance take effect; the old refresh token is not invalidated (there
    /// is no revocation store).
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse> {
        let claims = self.tokens.validate(refresh_token, TokenKind::Refresh)?;
        let identity = claims.authenticated_user()?;

        let user = self
            .store
            .find_by_id(identity.id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.is_active {
            return Err(AppError::UserDeactivated);
        }

        let access_token = self.tokens.issue_access(&user)?;
        let refresh_token = self.tokens.issue_refresh(&user)?;

        tracing::debug!(username = %user.username, "tokens rotated");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
            expires_in: self.tokens.access_expiry_minutes(),
        })
    }

    /// Best-effort logout. There is no server-side state to invalidate; the
    /// token is parsed only to log who logged out, and an invalid token is
    /// not an error.
    pub async fn logout(&self, token: &str) {
        match self
            .tokens
            .validate(token, TokenKind::Access)
            .and_then(|c| c.authenticated_user())
        {
            Ok(identity) => {
                tracing::info!(username = %identity.username, "user logged out");
            }
            Err(_) => {
                tracing::debug!("logout with invalid or expired token");
            }
        }
    }

    /// Validates an access token and returns the current user record,
    /// rejecting deactivated accounts even when the token itself is still
    /// cryptographically valid.
    pub async fn validate_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.validate(token, TokenKind::Access)?;
        let identity = claims.authenticated_user()?;

        let user = self
            .store
            .find_by_id(identity.id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.is_active {
            return Err(AppError::UserDeactivated);
        }

        Ok(user)
    }
}
