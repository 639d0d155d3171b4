#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use blog_api::{AppState, config::Config};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "hunter22hunter22";

pub fn test_config() -> Config {
    let mut config = Config::with_secret("integration-test-secret");
    config.bcrypt_cost = 4;
    config
}

pub fn test_app() -> Router {
    app_with(test_config())
}

pub fn app_with(config: Config) -> Router {
    blog_api::app(AppState::new(config).unwrap())
}

/// Sends one request through the router and returns the status and JSON body
/// (`Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    read(app.clone().oneshot(request).await.unwrap()).await
}

pub async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn create_user(app: &Router, username: &str, email: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/api/users",
        json!({ "username": username, "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
    body
}

pub async fn create_post(app: &Router, user_id: &str, title: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/api/posts",
        json!({ "title": title, "content": "Some content", "user_id": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
    body
}

/// POSTs an already encoded form body and returns the raw response.
pub async fn post_form(app: &Router, uri: &str, form: String) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Submits the OAuth2 password form and returns the raw response.
pub async fn login_raw(app: &Router, email: &str, password: &str) -> axum::response::Response {
    let form = format!("username={email}&password={password}").replace('@', "%40");
    post_form(app, "/api/users/token", form).await
}

pub async fn login(app: &Router, email: &str) -> String {
    let (status, body) = read(login_raw(app, email, PASSWORD).await).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}
