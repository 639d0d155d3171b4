use crate::models::{Post, User};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What anyone may see about a user.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub image_file: Option<String>,
    pub image_path: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            image_path: user.image_path(),
            username: user.username,
            image_file: user.image_file,
        }
    }
}

/// What the user sees about themselves.
#[derive(Debug, Serialize)]
pub struct UserPrivate {
    #[serde(flatten)]
    pub public: UserPublic,
    pub email: String,
}

impl From<User> for UserPrivate {
    fn from(mut user: User) -> Self {
        let email = std::mem::take(&mut user.email);
        Self {
            public: user.into(),
            email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub date_posted: DateTime<Utc>,
    pub author: UserPublic,
}

impl PostResponse {
    pub fn new(post: Post, author: User) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            user_id: post.user_id,
            date_posted: post.date_posted,
            author: author.into(),
        }
    }
}

impl From<(Post, User)> for PostResponse {
    fn from((post, author): (Post, User)) -> Self {
        Self::new(post, author)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}
