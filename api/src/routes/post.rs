use crate::{
    AppState,
    db::{NewPost, PostChanges},
    dto::{
        CreatePostRequest, PaginatedResponse, PaginationParams, PostResponse, UpdatePostRequest,
    },
    errors::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{Post, User},
};
use axum::{Json, extract::State, http::StatusCode};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Cuts one page out of an ordered snapshot of posts joined with their
/// authors. `total` counts the same snapshot the page is cut from.
pub(crate) fn paginate(
    posts: Vec<(Post, User)>,
    params: &PaginationParams,
) -> PaginatedResponse<PostResponse> {
    let total = posts.len();
    let data = params
        .slice(&posts)
        .into_iter()
        .map(PostResponse::from)
        .collect();

    PaginatedResponse {
        data,
        page: params.page,
        limit: params.limit,
        total,
    }
}

/// POST /api/posts
/// Body: { "title": "...", "content": "...", "user_id": "..." }
pub async fn create_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let (post, author) = state.db.create_post(NewPost {
        user_id: payload.user_id,
        title: payload.title,
        content: payload.content,
    })?;

    info!("Post created: {} by user {}", post.id, post.user_id);

    Ok((StatusCode::CREATED, Json(PostResponse::new(post, author))))
}

/// GET /api/posts?page=1&limit=10
pub async fn get_posts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<PaginatedResponse<PostResponse>>, ApiError> {
    params
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let posts = state.db.posts();

    Ok(Json(paginate(posts, &params)))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.db.post(id).ok_or(ApiError::PostNotFound)?;

    Ok(Json(post.into()))
}

/// PUT /api/posts/:id
/// Body: { "title": "...", "content": "...", "user_id": "..." }
pub async fn replace_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let (post, author) = state.db.update_post(
        id,
        PostChanges {
            user_id: Some(payload.user_id),
            title: Some(payload.title),
            content: Some(payload.content),
        },
    )?;

    info!("Post replaced: {}", post.id);

    Ok(Json(PostResponse::new(post, author)))
}

/// PATCH /api/posts/:id
/// Body: any of { "title", "content" }
pub async fn update_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let (post, author) = state.db.update_post(
        id,
        PostChanges {
            user_id: None,
            title: payload.title,
            content: payload.content,
        },
    )?;

    info!("Post updated: {}", post.id);

    Ok(Json(PostResponse::new(post, author)))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_post(id)?;

    info!("Post deleted: {}", id);

    Ok(StatusCode::NO_CONTENT)
}
