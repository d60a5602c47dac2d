pub mod booking;
pub mod catalog;
pub mod identity;
pub mod query;
pub mod repository;
pub mod search;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
