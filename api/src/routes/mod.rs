pub mod health;
pub mod post;
pub mod user;

use crate::{AppState, errors::ApiError};
use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    routing::{get, post},
};
use tower::{ServiceBuilder, limit::GlobalConcurrencyLimitLayer, timeout::error::Elapsed};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the full application: routes, state and middleware.
pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Router::layer wraps every route on its own, so the permit pool has to
    // be shared explicitly for the cap to hold across the whole server.
    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(GlobalConcurrencyLimitLayer::new(
            state.config.max_concurrent_requests,
        ))
        .timeout(state.config.request_timeout);

    Router::new()
        .route("/health", get(health::health_check))
        // Users
        .route("/api/users", post(user::create_user))
        .route("/api/users/token", post(user::login))
        .route("/api/users/me", get(user::get_current_user))
        .route(
            "/api/users/{id}",
            get(user::get_user)
                .patch(user::update_user)
                .delete(user::delete_user),
        )
        .route("/api/users/{id}/posts", get(user::get_user_posts))
        // Posts
        .route("/api/posts", get(post::get_posts).post(post::create_post))
        .route(
            "/api/posts/{id}",
            get(post::get_post)
                .put(post::replace_post)
                .patch(post::update_post)
                .delete(post::delete_post),
        )
        .with_state(state)
        .layer(middleware)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::InternalError(format!("Unhandled middleware error: {err}"))
    }
}
