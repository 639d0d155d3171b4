//! Blog backend: users, posts and bearer-token login over a JSON API.

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod extract;
pub mod models;
pub mod password;
pub mod routes;
pub mod states;

pub use routes::router as app;
pub use states::AppState;
