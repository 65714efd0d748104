use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    pub fn not_found(key: &str) -> Self { Self::NotFound(format!("key '{}' not found", key)) }

    pub fn conflict(key: &str) -> Self { Self::Conflict(format!("key '{}' already exists", key)) }
}
