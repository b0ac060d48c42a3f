use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TaskId: {0}")]
    InvalidTaskId(String),

    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
