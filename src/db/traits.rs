//! User store abstraction.
//!
//! The auth and user services only depend on the [`UserStore`] trait; the
//! concrete backend is chosen at startup via [`StoreProvider`].

use crate::types::{Result, Role, User};
use async_trait::async_trait;

/// Store provider configuration
#[derive(Debug, Clone, Default)]
pub enum StoreProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
}

impl StoreProvider {
    /// Create a user store from this provider configuration.
    ///
    /// Runs schema initialization and seeds the default admin account if no
    /// admin exists yet.
    pub async fn create_store(&self) -> Result<Box<dyn UserStore>> {
        match self {
            StoreProvider::Memory => {
                let store = super::sqlite::SqliteStore::new_memory().await?;
                Ok(Box::new(store))
            }
            StoreProvider::SQLite { path } => {
                let store = super::sqlite::SqliteStore::new_local(path).await?;
                Ok(Box::new(store))
            }
        }
    }
}

/// Credential store consumed by the auth core and the user service.
///
/// Lookups return `Ok(None)` for absent users so callers can distinguish
/// not-found from infrastructure failure (`AppError::Database`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Inserts the user and returns it with its store-assigned id and
    /// timestamps.
    async fn create(&self, user: &User) -> Result<User>;

    async fn update(&self, user: &User) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Users ordered by creation time, newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;

    async fn count(&self) -> Result<i64>;

    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<User>>;

    /// Stamps the user's last-login time. Callers treat failure as
    /// best-effort and never fail the surrounding operation on it.
    async fn record_last_login(&self, id: i64) -> Result<()>;
}
