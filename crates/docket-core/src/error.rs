//! The caller-visible error taxonomy for `docket-core`.
//!
//! Every failure a caller can see carries a machine-readable code alongside
//! the human-readable message. Validation failures name the offending field
//! where one exists. Overlap conflicts are expected, user-recoverable
//! conditions (pick another slot), never retried internally.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
  /// Malformed or out-of-range input; the caller's fault.
  #[error("{message}")]
  Validation {
    /// The offending field, when the failure is attributable to one.
    field:   Option<&'static str>,
    message: String,
  },

  /// A referenced entity is absent or soft-deleted.
  #[error("{0} not found")]
  NotFound(&'static str),

  /// The candidate interval overlaps an existing booking-impacting
  /// appointment for the same lawyer.
  #[error("{0}")]
  Conflict(String),

  /// An underlying storage failure; not part of the caller taxonomy proper.
  #[error("storage error: {0}")]
  Storage(String),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field: Some(field), message: message.into() }
  }

  pub fn overlap() -> Self {
    Self::Conflict("appointment overlaps with existing booking".into())
  }

  /// The machine-readable code included in every error payload.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Validation { .. } => "VALIDATION_ERROR",
      Self::NotFound(_) => "NOT_FOUND",
      Self::Conflict(_) => "CONFLICT",
      Self::Storage(_) => "STORAGE_ERROR",
    }
  }

  /// The offending field, for validation errors that name one.
  pub fn field(&self) -> Option<&'static str> {
    match self {
      Self::Validation { field, .. } => *field,
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
