//! The `ScheduleStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `docket-store-sqlite`).
//! Higher layers (`docket-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  appointment::{Appointment, AppointmentStatus, NewAppointment, Transition},
  directory::{Case, CaseRef, Client, Lawyer, NewCase, NewClient, NewLawyer},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Allow-listed sort columns for [`ScheduleStore::list_appointments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  #[default]
  StartAt,
  CreatedAt,
  UpdatedAt,
  Status,
}

impl SortKey {
  /// Parse a caller-supplied sort key, falling back to `start_at` for
  /// anything outside the allow-list. Never an error: sorting is cosmetic.
  pub fn parse_or_default(s: Option<&str>) -> Self {
    match s {
      Some("created_at") => Self::CreatedAt,
      Some("updated_at") => Self::UpdatedAt,
      Some("status") => Self::Status,
      _ => Self::StartAt,
    }
  }

  pub fn column(self) -> &'static str {
    match self {
      Self::StartAt => "start_at",
      Self::CreatedAt => "created_at",
      Self::UpdatedAt => "updated_at",
      Self::Status => "status",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
  Asc,
  #[default]
  Desc,
}

impl SortDir {
  pub fn parse_or_default(s: Option<&str>) -> Self {
    match s {
      Some("asc") | Some("ASC") => Self::Asc,
      _ => Self::Desc,
    }
  }

  pub fn keyword(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Parameters for [`ScheduleStore::list_appointments`].
///
/// Date-range filters apply to `start_at`, half-open: `start_at >= from`
/// and `start_at < to`.
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
  pub from:      Option<NaiveDateTime>,
  pub to:        Option<NaiveDateTime>,
  pub status:    Option<AppointmentStatus>,
  pub client_id: Option<Uuid>,
  pub case_id:   Option<Uuid>,
  pub lawyer_id: Option<Uuid>,
  pub sort:      SortKey,
  pub dir:       SortDir,
  /// 1-based page number; values below 1 are treated as 1.
  pub page:      u32,
  /// Page size, clamped to 1..=[`MAX_PAGE_LIMIT`]; 0 means the default.
  pub limit:     u32,
}

impl AppointmentQuery {
  pub fn page(&self) -> u32 { self.page.max(1) }

  pub fn limit(&self) -> u32 {
    if self.limit == 0 {
      DEFAULT_PAGE_LIMIT
    } else {
      self.limit.min(MAX_PAGE_LIMIT)
    }
  }

  pub fn offset(&self) -> u32 { (self.page() - 1) * self.limit() }
}

/// A listed appointment, enriched with denormalised display names.
/// Names are absent when the referent has been soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRow {
  #[serde(flatten)]
  pub appointment: Appointment,
  pub client_name: Option<String>,
  pub case_title:  Option<String>,
  pub lawyer_name: Option<String>,
}

/// One page of matching active appointments plus the total match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentPage {
  pub page:  u32,
  pub limit: u32,
  pub total: u64,
  pub items: Vec<AppointmentRow>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Docket scheduling backend.
///
/// Implementations own the no-overlap invariant: every write that could
/// book a lawyer's slot (create, full update, confirm) must run its
/// referential checks, the overlap check, and the write as one atomic unit
/// against a single writer, so two concurrent requests cannot both pass
/// the check and both insert.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ScheduleStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Appointments ──────────────────────────────────────────────────────

  /// Validate references, run the overlap check when the input has a
  /// lawyer and a booking-impacting status, and persist a new row.
  fn create_appointment(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Retrieve an active appointment. Returns `None` if missing or
  /// soft-deleted.
  fn get_appointment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  /// Replace all mutable fields atomically, re-running validation checks
  /// and the overlap check (excluding the row itself). Bumps `updated_at`.
  fn update_appointment(
    &self,
    id: Uuid,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Apply a status transition. `Confirm` re-checks the stored interval
  /// against the lawyer's other bookings first and fails with a conflict
  /// (no mutation) if the slot was taken in the meantime.
  fn transition_appointment(
    &self,
    id: Uuid,
    transition: Transition,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Mark the row deleted. It disappears from all listings and overlap
  /// checks from that point on.
  fn soft_delete_appointment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Filtered, sorted, paginated listing of active appointments with
  /// denormalised display names.
  fn list_appointments<'a>(
    &'a self,
    query: &'a AppointmentQuery,
  ) -> impl Future<Output = Result<AppointmentPage, Self::Error>> + Send + 'a;

  /// The half-open interval test: true iff another active appointment for
  /// `lawyer_id` with a booking-impacting status intersects
  /// `[start_at, end_at)`. `exclude` removes a row from consideration so
  /// an appointment never conflicts with itself on update/confirm.
  fn has_conflict(
    &self,
    lawyer_id: Uuid,
    start_at: NaiveDateTime,
    end_at: NaiveDateTime,
    exclude: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Directory ─────────────────────────────────────────────────────────

  fn add_client(
    &self,
    input: NewClient,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Whether `id` resolves to an active (non-deleted) client.
  fn client_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn soft_delete_client(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fails if the owning client does not resolve to an active record.
  fn add_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  /// The id/owner slice of an active case, or `None`.
  fn get_case(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CaseRef>, Self::Error>> + Send + '_;

  fn soft_delete_case(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_lawyer(
    &self,
    input: NewLawyer,
  ) -> impl Future<Output = Result<Lawyer, Self::Error>> + Send + '_;

  /// Whether `id` resolves to an active (non-deleted) lawyer.
  fn lawyer_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn soft_delete_lawyer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
