//! Error type for `rollcall-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] rollcall_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("stored value could not be decoded: {0}")]
  Decode(String),

  /// Attempted to attach an embedding to a subject that does not exist.
  #[error("subject not found: {0}")]
  SubjectNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
