use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Validate, Deserialize)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 100, message = "Password must be 8-100 characters"))]
    pub password: String,
}

/// Only the fields that are present get applied.
#[derive(Debug, Default, Validate, Deserialize)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Image file name must be 1-200 characters"))]
    pub image_file: Option<String>,
}

/// OAuth2 password-grant form. `username` carries the email address.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Body for creating a post and for replacing one wholesale.
#[derive(Debug, Validate, Deserialize)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
    pub user_id: Uuid,
}

#[derive(Debug, Default, Validate, Deserialize)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
}

/// Pagination query parameters
#[derive(Debug, Validate, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page starts at 1"))]
    pub page: usize,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be 1-100"))]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}
fn default_limit() -> usize {
    10
}

impl PaginationParams {
    /// The slice of `items` this page covers. Past the end is empty.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = self.page.saturating_sub(1).saturating_mul(self.limit);
        if start >= items.len() {
            return vec![];
        }
        let end = start.saturating_add(self.limit).min(items.len());
        items[start..end].to_vec()
    }
}
