use crate::{
    auth::AuthUser,
    types::{
        AppError, CreateUserRequest, ListUsersQuery, Result, Role, UpdateUserRequest, User,
        UserListResponse,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// List users. Admins see every account; managers only see `user` and
/// `guest` accounts. The route itself is gated to manager-or-higher.
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>> {
    let page = if identity.role == Role::Admin {
        state.user_service.list_users(query).await?
    } else {
        state.user_service.list_users_for_manager(query).await?
    };
    Ok(Json(page))
}

/// Fetch a single user. Managers cannot inspect privileged accounts.
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    let user = state.user_service.get_user(id).await?;

    if identity.role != Role::Admin && user.role.is_manager_or_higher() {
        return Err(AppError::Forbidden(
            "insufficient role to view this account".to_string(),
        ));
    }

    Ok(Json(user))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid username or password"),
        (status = 409, description = "Username already taken")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.user_service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let user = state.user_service.update_user(id, payload).await?;
    Ok(Json(user))
}

/// Delete a user. Admins cannot delete their own account.
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if identity.id == id {
        return Err(AppError::Forbidden(
            "cannot delete your own account".to_string(),
        ));
    }

    state.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    let user = state.user_service.activate_user(id).await?;
    Ok(Json(user))
}

/// Deactivate a user. Admins cannot lock themselves out.
pub async fn deactivate_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    if identity.id == id {
        return Err(AppError::Forbidden(
            "cannot deactivate your own account".to_string(),
        ));
    }

    let user = state.user_service.deactivate_user(id).await?;
    Ok(Json(user))
}
