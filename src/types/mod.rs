use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Domain Types =============

/// User roles, ordered by privilege: admin > manager > user >= guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
    Guest,
}

impl Role {
    /// Parses a role name, falling back to `Role::User` for unknown or empty
    /// input. Registration and admin user creation both accept free-form role
    /// strings and default rather than reject.
    pub fn from_name_or_default(name: Option<&str>) -> Role {
        match name {
            Some("admin") => Role::Admin,
            Some("manager") => Role::Manager,
            Some("user") => Role::User,
            Some("guest") => Role::Guest,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }

    pub fn is_manager_or_higher(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account as stored by the credential store.
///
/// The password hash is never serialized into API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_manager_or_higher(&self) -> bool {
        self.role.is_manager_or_higher()
    }
}

// User is Serialize-only on the API surface; the manual Deserialize exists so
// test clients can read it back out of responses (password_hash is absent
// there and defaults to empty).
impl<'de> Deserialize<'de> for User {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct UserWire {
            id: i64,
            username: String,
            #[serde(default)]
            password_hash: String,
            #[serde(default)]
            first_name: String,
            #[serde(default)]
            last_name: String,
            role: Role,
            is_active: bool,
            #[serde(default)]
            last_login: Option<DateTime<Utc>>,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
        }

        let wire = UserWire::deserialize(deserializer)?;
        Ok(User {
            id: wire.id,
            username: wire.username,
            password_hash: wire.password_hash,
            first_name: wire.first_name,
            last_name: wire.last_name,
            role: wire.role,
            is_active: wire.is_active,
            last_login: wire.last_login,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

// ============= Token Types =============

/// Discriminator embedded in every token, binding it to one token class.
///
/// An access token must never validate where a refresh token is expected and
/// vice versa, independently of the per-class signing secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims carried by both token classes.
///
/// Strongly typed: malformed or missing fields fail at decode time instead of
/// surfacing as runtime type assertions downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    pub username: String,
    pub role: Role,
    pub token_kind: TokenKind,
}

impl Claims {
    /// Extracts the request-scoped identity from validated claims.
    ///
    /// Fails with `AppError::InvalidToken` if the subject is not a numeric
    /// user id.
    pub fn authenticated_user(&self) -> Result<AuthenticatedUser> {
        let id = self
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::InvalidToken("malformed subject claim".to_string()))?;

        Ok(AuthenticatedUser {
            id,
            username: self.username.clone(),
            role: self.role,
        })
    }
}

/// Identity derived from a validated access token, attached to the request
/// extensions by the auth middleware and dropped at request end.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Free-form role name; unknown values default to `user`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
    /// Access token lifetime in minutes.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user account is deactivated")]
    UserDeactivated,

    #[error("invalid username: must be at least 3 characters")]
    InvalidUsername,

    #[error("password too short: must be at least 8 characters")]
    PasswordTooShort,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("wrong token type: expected {expected}")]
    WrongTokenType { expected: TokenKind },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match &self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::UserAlreadyExists => (StatusCode::CONFLICT, self.to_string()),
            AppError::UserDeactivated => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::InvalidUsername | AppError::PasswordTooShort => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::InvalidToken(_)
            | AppError::TokenExpired
            | AppError::WrongTokenType { .. }
            | AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Database(detail) | AppError::Internal(detail) => {
                // Infrastructure detail stays in the logs, not the response.
                tracing::error!(error = %detail, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
