use crate::auth::middleware::{self, AuthGate};
use crate::AppState;
use axum::{
    middleware as axum_middleware, Router,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

async fn openapi_spec() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(crate::api::ApiDoc::openapi())
}

/// Builds the full application router.
///
/// Layering, innermost first: role gates wrap only their own route group,
/// the authentication gate wraps every non-public group, and trace/CORS wrap
/// everything.
pub fn create_router(state: AppState) -> Router {
    let gate = AuthGate {
        tokens: state.tokens.clone(),
        auth: state.auth_service.clone(),
        cookies: state.cookies.clone(),
    };

    let public_routes = Router::new()
        .route("/auth/register", post(crate::api::handlers::auth::register))
        .route("/auth/login", post(crate::api::handlers::auth::login))
        .route("/auth/refresh", post(crate::api::handlers::auth::refresh))
        .route(
            "/auth/reset-password",
            post(crate::api::handlers::auth::reset_password),
        )
        // Logout is best-effort cookie clearing and must work even with an
        // expired or absent token, so it skips the auth gate.
        .route("/auth/logout", post(crate::api::handlers::auth::logout))
        .route("/health", get(crate::api::handlers::auth::health))
        .route("/openapi.json", get(openapi_spec));

    let protected_routes = Router::new()
        .route("/auth/me", get(crate::api::handlers::auth::me))
        .route(
            "/auth/change-password",
            post(crate::api::handlers::auth::change_password),
        );

    let manager_routes = Router::new()
        .route("/users", get(crate::api::handlers::users::list_users))
        .route("/users/{id}", get(crate::api::handlers::users::get_user))
        .layer(axum_middleware::from_fn(
            middleware::require_manager_or_higher,
        ));

    let admin_routes = Router::new()
        .route("/users", post(crate::api::handlers::users::create_user))
        .route(
            "/users/{id}",
            put(crate::api::handlers::users::update_user)
                .delete(crate::api::handlers::users::delete_user),
        )
        .route(
            "/users/{id}/activate",
            post(crate::api::handlers::users::activate_user),
        )
        .route(
            "/users/{id}/deactivate",
            post(crate::api::handlers::users::deactivate_user),
        )
        .layer(axum_middleware::from_fn(middleware::require_admin));

    let authenticated = protected_routes
        .merge(manager_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn(move |req, next| {
            let gate = gate.clone();
            async move { middleware::require_auth(gate, req, next).await }
        }));

    Router::new()
        .nest("/api", public_routes.merge(authenticated))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
