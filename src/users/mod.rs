//! User administration.
//!
//! Everything the admin and manager surfaces need beyond authentication:
//! CRUD, listing with filters and pagination, activation toggling, and
//! password changes. Authorization happens at the route layer; this service
//! only distinguishes the full listing from the manager-restricted one.

use crate::auth::password;
use crate::db::UserStore;
use crate::types::{
    AppError, ChangePasswordRequest, CreateUserRequest, ListUsersQuery, Result, Role,
    UpdateUserRequest, User, UserListResponse,
};
use chrono::Utc;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Admin-side account creation. Unlike self-registration the caller
    /// chooses the role and the initial active flag.
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
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
            is_active: req.is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create(&user).await?;
        tracing::info!(username = %created.username, role = %created.role, "user created");
        Ok(created)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.store.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    /// Applies the request's set fields and stamps `updated_at`. A username
    /// change checks availability first.
    pub async fn update_user(&self, id: i64, req: UpdateUserRequest) -> Result<User> {
        let mut user = self.get_user(id).await?;

        if let Some(username) = req.username {
            if username != user.username {
                if username.len() < 3 {
                    return Err(AppError::InvalidUsername);
                }
                if self.store.find_by_username(&username).await?.is_some() {
                    return Err(AppError::UserAlreadyExists);
                }
                user.username = username;
            }
        }
        if let Some(first_name) = req.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = req.role {
            user.role = Role::from_name_or_default(Some(&role));
        }
        if let Some(is_active) = req.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        self.store.update(&user).await?;
        tracing::info!(username = %user.username, "user updated");
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    /// Full listing for admins; every role is visible.
    pub async fn list_users(&self, query: ListUsersQuery) -> Result<UserListResponse> {
        self.list_filtered(query, None).await
    }

    /// Manager-restricted listing: only `user` and `guest` accounts are
    /// visible, regardless of any role filter in the query.
    pub async fn list_users_for_manager(&self, query: ListUsersQuery) -> Result<UserListResponse> {
        self.list_filtered(query, Some(&[Role::User, Role::Guest]))
            .await
    }

    async fn list_filtered(
        &self,
        query: ListUsersQuery,
        visible_roles: Option<&[Role]>,
    ) -> Result<UserListResponse> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        let role_filter = query.role.as_deref().and_then(parse_role);
        let filtered = visible_roles.is_some()
            || role_filter.is_some()
            || query.search.is_some()
            || query.is_active.is_some();

        // The unfiltered admin listing pages in the store; filtered views
        // narrow by role in the store and finish in memory.
        if !filtered {
            let users = self.store.list(limit, offset).await?;
            let total = self.store.count().await?;
            return Ok(UserListResponse {
                users,
                total,
                limit,
                offset,
            });
        }

        let roles: Vec<Role> = match (visible_roles, role_filter) {
            (Some(visible), Some(role)) if !visible.contains(&role) => Vec::new(),
            (_, Some(role)) => vec![role],
            (Some(visible), None) => visible.to_vec(),
            (None, None) => vec![Role::Admin, Role::Manager, Role::User, Role::Guest],
        };

        let mut users = if roles.is_empty() {
            Vec::new()
        } else {
            self.store.find_by_roles(&roles).await?
        };

        if let Some(search) = query.search.as_deref() {
            let needle = search.to_lowercase();
            users.retain(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.first_name.to_lowercase().contains(&needle)
                    || u.last_name.to_lowercase().contains(&needle)
            });
        }
        if let Some(is_active) = query.is_active {
            users.retain(|u| u.is_active == is_active);
        }

        let total = users.len() as i64;
        let users = users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(UserListResponse {
            users,
            total,
            limit,
            offset,
        })
    }

    /// Self-service password change; requires the current password.
    pub async fn change_password(&self, id: i64, req: ChangePasswordRequest) -> Result<()> {
        let mut user = self.get_user(id).await?;

        if !password::verify_password(&req.current_password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }
        if req.new_password.len() < 8 {
            return Err(AppError::PasswordTooShort);
        }

        user.password_hash = password::hash_password(&req.new_password)?;
        user.updated_at = Utc::now();
        self.store.update(&user).await?;

        tracing::info!(username = %user.username, "password changed");
        Ok(())
    }

    pub async fn activate_user(&self, id: i64) -> Result<User> {
        self.set_active(id, true).await
    }

    pub async fn deactivate_user(&self, id: i64) -> Result<User> {
        self.set_active(id, false).await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<User> {
        let mut user = self.get_user(id).await?;
        user.is_active = active;
        user.updated_at = Utc::now();
        self.store.update(&user).await?;

        tracing::info!(username = %user.username, is_active = active, "active flag changed");
        Ok(user)
    }

    /// Accepts a reset request without revealing whether the account exists.
    /// Delivery of the reset credential is out of band; the request is only
    /// recorded here.
    pub async fn request_password_reset(&self, username: &str) -> Result<()> {
        match self.store.find_by_username(username).await? {
            Some(user) => {
                tracing::info!(username = %user.username, "password reset requested");
            }
            None => {
                tracing::debug!("password reset requested for unknown username");
            }
        }
        Ok(())
    }
}

/// Strict role parse for list filters; an unrecognized name means no filter
/// rather than silently matching `user`.
fn parse_role(name: &str) -> Option<Role> {
    match name {
        "admin" => Some(Role::Admin),
        "manager" => Some(Role::Manager),
        "user" => Some(Role::User),
        "guest" => Some(Role::Guest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MemoryStore {
        users: Mutex<Vec<User>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                users: Mutex::new(Vec::new()),
            }
        }

        fn with_user(self, user: User) -> Self {
            self.users.lock().unwrap().push(user);
            self
        }
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }

        async fn create(&self, user: &User) -> Result<User> {
            let mut users = self.users.lock().unwrap();
            let mut created = user.clone();
            created.id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
            users.push(created.clone());
            Ok(created)
        }

        async fn update(&self, user: &User) -> Result<()> {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => {
                    *existing = user.clone();
                    Ok(())
                }
                None => Err(AppError::UserNotFound),
            }
        }

        async fn delete(&self, id: i64) -> Result<()> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return Err(AppError::UserNotFound);
            }
            Ok(())
        }

        async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
            let users = self.users.lock().unwrap();
            Ok(users
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn count(&self) -> Result<i64> {
            Ok(self.users.lock().unwrap().len() as i64)
        }

        async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| roles.contains(&u.role))
                .cloned()
                .collect())
        }

        async fn record_last_login(&self, _id: i64) -> Result<()> {
            Ok(())
        }
    }

    fn seeded_user(id: i64, username: &str, role: Role) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: password::hash_password("password123").unwrap(),
            first_name: format!("{username}-first"),
            last_name: format!("{username}-last"),
            role,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service_with(store: MemoryStore) -> (UserService, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let service = UserService::new(store.clone());
        (service, store)
    }

    fn create_request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "password123".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_user_with_role_and_flag() {
        let (service, _) = service_with(MemoryStore::new());

        let created = service
            .create_user(CreateUserRequest {
                username: "carol".to_string(),
                password: "password123".to_string(),
                first_name: "Carol".to_string(),
                last_name: "Jones".to_string(),
                role: Some("manager".to_string()),
                is_active: false,
            })
            .await
            .expect("should create");

        assert_eq!(created.role, Role::Manager);
        assert!(!created.is_active);
        assert_ne!(created.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (service, _) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        let mut short_name = create_request("ab");
        short_name.password = "password123".to_string();
        assert!(matches!(
            service.create_user(short_name).await,
            Err(AppError::InvalidUsername)
        ));

        let mut short_password = create_request("carol");
        short_password.password = "short".to_string();
        assert!(matches!(
            service.create_user(short_password).await,
            Err(AppError::PasswordTooShort)
        ));

        assert!(matches!(
            service.create_user(create_request("alice")).await,
            Err(AppError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let (service, _) = service_with(MemoryStore::new());
        assert!(matches!(
            service.get_user(99).await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_user_partial() {
        let (service, store) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        let updated = service
            .update_user(
                1,
                UpdateUserRequest {
                    first_name: Some("Alicia".to_string()),
                    role: Some("manager".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("should update");

        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.role, Role::Manager);
        assert_eq!(updated.username, "alice", "unset fields untouched");

        let stored = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_update_user_rename_checks_availability() {
        let (service, _) = service_with(
            MemoryStore::new()
                .with_user(seeded_user(1, "alice", Role::User))
                .with_user(seeded_user(2, "bobby", Role::User)),
        );

        let taken = service
            .update_user(
                1,
                UpdateUserRequest {
                    username: Some("bobby".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(AppError::UserAlreadyExists)));

        // Re-submitting the current name is a no-op, not a conflict.
        let same = service
            .update_user(
                1,
                UpdateUserRequest {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (service, store) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        service.delete_user(1).await.expect("should delete");
        assert!(store.find_by_id(1).await.unwrap().is_none());

        assert!(matches!(
            service.delete_user(1).await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_users_pagination() {
        let mut store = MemoryStore::new();
        for i in 1..=5 {
            store = store.with_user(seeded_user(i, &format!("user{i:02}"), Role::User));
        }
        let (service, _) = service_with(store);

        let page = service
            .list_users(ListUsersQuery {
                limit: Some(2),
                offset: Some(2),
                ..Default::default()
            })
            .await
            .expect("should list");

        assert_eq!(page.users.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 2);
    }

    #[tokio::test]
    async fn test_list_users_limit_clamped() {
        let (service, _) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        let page = service
            .list_users(ListUsersQuery {
                limit: Some(10_000),
                ..Default::default()
            })
            .await
            .expect("should list");
        assert_eq!(page.limit, MAX_PAGE_SIZE);

        let default = service
            .list_users(ListUsersQuery::default())
            .await
            .expect("should list");
        assert_eq!(default.limit, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_list_users_filters() {
        let (service, _) = service_with(
            MemoryStore::new()
                .with_user(seeded_user(1, "admin", Role::Admin))
                .with_user(seeded_user(2, "maria", Role::Manager))
                .with_user(seeded_user(3, "alice", Role::User))
                .with_user({
                    let mut u = seeded_user(4, "bobby", Role::User);
                    u.is_active = false;
                    u
                }),
        );

        let managers = service
            .list_users(ListUsersQuery {
                role: Some("manager".to_string()),
                ..Default::default()
            })
            .await
            .expect("should list");
        assert_eq!(managers.total, 1);
        assert_eq!(managers.users[0].username, "maria");

        let search = service
            .list_users(ListUsersQuery {
                search: Some("ali".to_string()),
                ..Default::default()
            })
            .await
            .expect("should list");
        assert_eq!(search.total, 1);
        assert_eq!(search.users[0].username, "alice");

        let inactive = service
            .list_users(ListUsersQuery {
                is_active: Some(false),
                ..Default::default()
            })
            .await
            .expect("should list");
        assert_eq!(inactive.total, 1);
        assert_eq!(inactive.users[0].username, "bobby");
    }

    #[tokio::test]
    async fn test_manager_listing_hides_privileged_accounts() {
        let (service, _) = service_with(
            MemoryStore::new()
                .with_user(seeded_user(1, "admin", Role::Admin))
                .with_user(seeded_user(2, "maria", Role::Manager))
                .with_user(seeded_user(3, "alice", Role::User))
                .with_user(seeded_user(4, "guesty", Role::Guest)),
        );

        let page = service
            .list_users_for_manager(ListUsersQuery::default())
            .await
            .expect("should list");

        assert_eq!(page.total, 2);
        assert!(page.users.iter().all(|u| !u.role.is_manager_or_higher()));

        // A role filter cannot widen the restricted view.
        let escalated = service
            .list_users_for_manager(ListUsersQuery {
                role: Some("admin".to_string()),
                ..Default::default()
            })
            .await
            .expect("should list");
        assert_eq!(escalated.total, 0);
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, store) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        let wrong_current = service
            .change_password(
                1,
                ChangePasswordRequest {
                    current_password: "not-the-password".to_string(),
                    new_password: "new-password-1".to_string(),
                },
            )
            .await;
        assert!(matches!(wrong_current, Err(AppError::InvalidCredentials)));

        let short_new = service
            .change_password(
                1,
                ChangePasswordRequest {
                    current_password: "password123".to_string(),
                    new_password: "short".to_string(),
                },
            )
            .await;
        assert!(matches!(short_new, Err(AppError::PasswordTooShort)));

        service
            .change_password(
                1,
                ChangePasswordRequest {
                    current_password: "password123".to_string(),
                    new_password: "new-password-1".to_string(),
                },
            )
            .await
            .expect("should change");

        let stored = store.find_by_id(1).await.unwrap().unwrap();
        assert!(password::verify_password("new-password-1", &stored.password_hash).unwrap());
        assert!(!password::verify_password("password123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_activation_toggle() {
        let (service, _) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        let deactivated = service.deactivate_user(1).await.expect("should deactivate");
        assert!(!deactivated.is_active);

        let reactivated = service.activate_user(1).await.expect("should activate");
        assert!(reactivated.is_active);
    }

    #[tokio::test]
    async fn test_password_reset_is_enumeration_safe() {
        let (service, _) = service_with(
            MemoryStore::new().with_user(seeded_user(1, "alice", Role::User)),
        );

        assert!(service.request_password_reset("alice").await.is_ok());
        assert!(service.request_password_reset("nobody").await.is_ok());
    }
}
