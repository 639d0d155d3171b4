use crate::errors::ApiError;
use bcrypt::{hash, verify};
use tokio::task;

/// bcrypt is CPU-bound, so both calls run on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::InternalError(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))
}

pub async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("Password verification task failed: {}", e)))?
        .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))
}
