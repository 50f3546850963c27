use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
  #[error("duplicate job id: {0}")]
  DuplicateId(String),
  #[error("storage unavailable: {0}")]
  Unavailable(#[source] sqlx::Error),
  #[error("storage error: {0}")]
  Storage(#[from] sqlx::Error),
  #[error("validation failed: {0}")]
  Validation(String),
}
