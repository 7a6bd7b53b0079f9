use crate::auth::password;
use crate::types::{AppError, Result, Role, User};
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection};

use super::traits::UserStore;
use async_trait::async_trait;

/// libsql-backed user store (in-memory or file-based SQLite).
///
/// Holds a single connection opened at build time. An in-memory SQLite
/// database is scoped to its connection, so all operations must run on the
/// connection the schema was created on; `Connection` is cheaply cloneable.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates an ephemeral in-memory store. Used by tests and as the
    /// zero-config default.
    pub async fn new_memory() -> Result<Self> {
        Self::build(":memory:").await
    }

    /// Creates or opens a file-based store.
    pub async fn new_local(path: &str) -> Result<Self> {
        Self::build(path).await
    }

    async fn build(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { conn };
        store.initialize_schema().await?;
        store.seed_admin().await?;

        Ok(store)
    }

    fn connection(&self) -> Connection {
        self.conn.clone()
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                role TEXT NOT NULL DEFAULT 'user'
                    CHECK (role IN ('admin', 'manager', 'user', 'guest')),
                is_active INTEGER NOT NULL DEFAULT 1,
                last_login INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        let indexes = [
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username)",
            "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
            "CREATE INDEX IF NOT EXISTS idx_users_is_active ON users(is_active)",
        ];
        for idx in indexes {
            conn.execute(idx, ())
                .await
                .map_err(|e| AppError::Database(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }

    /// Seeds a default admin account when no admin exists yet, mirroring a
    /// fresh deployment bootstrap.
    async fn seed_admin(&self) -> Result<()> {
        let conn = self.connection();

        let mut rows = conn
            .query("SELECT COUNT(*) FROM users WHERE role = 'admin'", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count admins: {}", e)))?;

        let admin_count: i64 = match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            None => 0,
        };

        if admin_count > 0 {
            return Ok(());
        }

        let hash = password::hash_password("admin123")?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO users (username, password_hash, first_name, last_name, role, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'admin', 1, ?, ?)",
            ("admin", hash, "Admin", "User", now, now),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to seed admin user: {}", e)))?;

        tracing::warn!("default admin account created (username: admin, password: admin123) - change it");
        Ok(())
    }
}

fn parse_role(role: &str) -> Role {
    Role::from_name_or_default(Some(role))
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Database(format!("invalid timestamp: {}", secs)))
}

fn row_to_user(row: &libsql::Row) -> Result<User> {
    let role: String = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;
    let is_active: i64 = row.get(6).map_err(|e| AppError::Database(e.to_string()))?;
    let last_login: Option<i64> = row.get(7).map_err(|e| AppError::Database(e.to_string()))?;

    Ok(User {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        username: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        password_hash: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        first_name: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        last_name: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
        role: parse_role(&role),
        is_active: is_active != 0,
        last_login: last_login.map(timestamp).transpose()?,
        created_at: timestamp(row.get(8).map_err(|e| AppError::Database(e.to_string()))?)?,
        updated_at: timestamp(row.get(9).map_err(|e| AppError::Database(e.to_string()))?)?,
    })
}

const USER_COLUMNS: &str = "id, username, password_hash, first_name, last_name, role, \
                            is_active, last_login, created_at, updated_at";

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connection();

        let mut rows = conn
            .query(
                &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                [username],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.connection();

        let mut rows = conn
            .query(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: &User) -> Result<User> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO users (username, password_hash, first_name, last_name, role, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                user.username.as_str(),
                user.password_hash.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.role.as_str(),
                user.is_active as i64,
                now,
                now,
            ),
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                AppError::UserAlreadyExists
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;

        let id = conn.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("created user not found".to_string()))
    }

    async fn update(&self, user: &User) -> Result<()> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        let affected = conn
            .execute(
                "UPDATE users SET
                    username = ?, password_hash = ?, first_name = ?,
                    last_name = ?, role = ?, is_active = ?, last_login = ?,
                    updated_at = ?
                 WHERE id = ?",
                (
                    user.username.as_str(),
                    user.password_hash.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.role.as_str(),
                    user.is_active as i64,
                    user.last_login.map(|t| t.timestamp()),
                    now,
                    user.id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?;

        if affected == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let conn = self.connection();

        let affected = conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        if affected == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let conn = self.connection();

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    USER_COLUMNS
                ),
                (limit, offset),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            users.push(row_to_user(&row)?);
        }

        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        let conn = self.connection();

        let mut rows = conn
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count users: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => row.get(0).map_err(|e| AppError::Database(e.to_string())),
            None => Ok(0),
        }
    }

    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection();
        let placeholders = vec!["?"; roles.len()].join(",");
        let params: Vec<libsql::Value> = roles
            .iter()
            .map(|r| libsql::Value::from(r.as_str()))
            .collect();

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM users WHERE role IN ({}) ORDER BY created_at DESC, id DESC",
                    USER_COLUMNS, placeholders
                ),
                params,
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query users by role: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            users.push(row_to_user(&row)?);
        }

        Ok(users)
    }

    async fn record_last_login(&self, id: i64) -> Result<()> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        let affected = conn
            .execute("UPDATE users SET last_login = ? WHERE id = ?", (now, id))
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;

        if affected == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
