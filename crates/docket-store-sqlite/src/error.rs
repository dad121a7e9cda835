//! Error type for `docket-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain-level failure (validation, not-found, conflict).
  #[error(transparent)]
  Core(#[from] docket_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored value failed to decode back into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl From<Error> for docket_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => docket_core::Error::Storage(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
