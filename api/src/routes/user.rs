use crate::{
    AppState,
    auth::authenticate,
    db::{NewUser, UserChanges},
    dto::{
        CreateUserRequest, LoginForm, PaginatedResponse, PaginationParams, PostResponse,
        TokenResponse, UpdateUserRequest, UserPrivate, UserPublic,
    },
    errors::ApiError,
    extract::{ApiForm, ApiJson, ApiPath, ApiQuery},
    password::{hash_password, verify_password},
    routes::post::paginate,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// POST /api/users
/// Body: { "username": "...", "email": "...", "password": "..." }
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserPrivate>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let password_hash = hash_password(payload.password, state.config.bcrypt_cost).await?;

    // Uniqueness is decided by the store, under its write lock.
    let user = state.db.create_user(NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
    })?;

    info!("New user registered: {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/users/token
/// Form: username=<email>&password=...
pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let login_name = form.username.trim().to_lowercase();

    if !state.login_throttle.check(&login_name) {
        warn!("Login rate limit hit for {}", login_name);
        return Err(ApiError::TooManyRequests);
    }

    // Unknown email and wrong password are indistinguishable to the caller,
    // in body and in time.
    let Some(user) = state.db.user_by_email(&login_name) else {
        verify_password(form.password, state.dummy_hash.to_string()).await?;
        return Err(ApiError::InvalidCredentials);
    };

    let valid = verify_password(form.password, user.password_hash.clone()).await?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(&user.id.to_string(), state.config.access_token_ttl)?;

    info!("User logged in: {}", user.email);

    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /api/users/me
/// Headers: Authorization: Bearer <token>
pub async fn get_current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserPrivate>, ApiError> {
    let subject = authenticate(&headers, &state.tokens)?;
    let user_id = Uuid::parse_str(&subject).map_err(|_| ApiError::InvalidToken)?;

    let user = state.db.user(user_id).ok_or(ApiError::UnknownSubject)?;

    Ok(Json(user.into()))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserPublic>, ApiError> {
    let user = state.db.user(id).ok_or(ApiError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// GET /api/users/:id/posts?page=1&limit=10
pub async fn get_user_posts(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<PaginatedResponse<PostResponse>>, ApiError> {
    params
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let posts = state.db.posts_by_user(id)?;

    Ok(Json(paginate(posts, &params)))
}

/// PATCH /api/users/:id
/// Body: any of { "username", "email", "image_file" }
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserPrivate>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state.db.update_user(
        id,
        UserChanges {
            username: payload.username,
            email: payload.email,
            image_file: payload.image_file,
        },
    )?;

    info!("User updated: {}", user.id);

    Ok(Json(user.into()))
}

/// DELETE /api/users/:id
/// Owned posts are deleted with the user.
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed_posts = state.db.delete_user(id)?;

    info!("User deleted: {} along with {} posts", id, removed_posts);

    Ok(StatusCode::NO_CONTENT)
}
