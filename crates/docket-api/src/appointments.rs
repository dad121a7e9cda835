//! Handlers for `/appointments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/appointments` | Filtered, sorted, paginated listing |
//! | `POST`   | `/appointments` | Body: [`AppointmentDraft`]; returns 201 + `{"id"}` |
//! | `GET`    | `/appointments/:id` | Single active appointment |
//! | `PUT`    | `/appointments/:id` | Full replace; body: [`AppointmentDraft`] |
//! | `DELETE` | `/appointments/:id` | Soft delete |
//! | `POST`   | `/appointments/:id/confirm` | Overlap re-check, then `confirmed` |
//! | `POST`   | `/appointments/:id/cancel` | Unconditional `cancelled` |
//! | `POST`   | `/appointments/:id/mark-done` | Unconditional `done` |
//! | `POST`   | `/appointments/:id/no-show` | Unconditional `no_show` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  appointment::{
    AppointmentDraft, AppointmentStatus, Transition, parse_time,
  },
  store::{AppointmentPage, AppointmentQuery, ScheduleStore, SortDir, SortKey},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, store_err};

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /appointments` — returns 201 + `{"id": ...}`.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(draft): Json<AppointmentDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore,
{
  let input = draft.validate()?;
  let appointment = store
    .create_appointment(input)
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(json!({ "id": appointment.id }))))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /appointments/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore,
{
  let appointment = store
    .get_appointment(id)
    .await
    .map_err(store_err)?
    .ok_or(ApiError(docket_core::Error::NotFound("appointment")))?;
  Ok(Json(appointment))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /appointments/:id` — full replace of all mutable fields.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(draft): Json<AppointmentDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore,
{
  let input = draft.validate()?;
  store
    .update_appointment(id, input)
    .await
    .map_err(store_err)?;
  Ok(Json(json!({ "ok": true })))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Inclusive lower bound on `start_at`, 'YYYY-MM-DD HH:MM:SS'.
  pub from:      Option<String>,
  /// Exclusive upper bound on `start_at`.
  pub to:        Option<String>,
  pub status:    Option<String>,
  pub client_id: Option<Uuid>,
  pub case_id:   Option<Uuid>,
  pub lawyer_id: Option<Uuid>,
  /// Allow-listed: start_at | created_at | updated_at | status.
  pub sort:      Option<String>,
  /// asc | desc (default desc).
  pub dir:       Option<String>,
  pub page:      Option<u32>,
  pub limit:     Option<u32>,
}

impl ListParams {
  fn into_query(self) -> Result<AppointmentQuery, ApiError> {
    let from = self
      .from
      .as_deref()
      .map(|s| {
        parse_time(s).ok_or_else(|| {
          docket_core::Error::validation("from", "from must be 'YYYY-MM-DD HH:MM:SS'")
        })
      })
      .transpose()?;
    let to = self
      .to
      .as_deref()
      .map(|s| {
        parse_time(s).ok_or_else(|| {
          docket_core::Error::validation("to", "to must be 'YYYY-MM-DD HH:MM:SS'")
        })
      })
      .transpose()?;
    let status = self
      .status
      .as_deref()
      .map(|s| {
        AppointmentStatus::parse(s)
          .ok_or_else(|| docket_core::Error::validation("status", "invalid status"))
      })
      .transpose()?;

    Ok(AppointmentQuery {
      from,
      to,
      status,
      client_id: self.client_id,
      case_id: self.case_id,
      lawyer_id: self.lawyer_id,
      sort: SortKey::parse_or_default(self.sort.as_deref()),
      dir: SortDir::parse_or_default(self.dir.as_deref()),
      page: self.page.unwrap_or(1),
      limit: self.limit.unwrap_or(0),
    })
  }
}

/// `GET /appointments` — page of active appointments with display names.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<AppointmentPage>, ApiError>
where
  S: ScheduleStore,
{
  let query = params.into_query()?;
  let page = store
    .list_appointments(&query)
    .await
    .map_err(store_err)?;
  Ok(Json(page))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

async fn transition<S>(
  store: &S,
  id: Uuid,
  t: Transition,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ScheduleStore,
{
  store
    .transition_appointment(id, t)
    .await
    .map_err(store_err)?;
  Ok(Json(json!({ "ok": true })))
}

/// `POST /appointments/:id/confirm`
pub async fn confirm<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  transition(store.as_ref(), id, Transition::Confirm).await
}

/// `POST /appointments/:id/cancel`
pub async fn cancel<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  transition(store.as_ref(), id, Transition::Cancel).await
}

/// `POST /appointments/:id/mark-done`
pub async fn mark_done<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  transition(store.as_ref(), id, Transition::MarkDone).await
}

/// `POST /appointments/:id/no-show`
pub async fn no_show<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  transition(store.as_ref(), id, Transition::MarkNoShow).await
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

/// `DELETE /appointments/:id` — soft delete.
pub async fn soft_delete<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore,
{
  store
    .soft_delete_appointment(id)
    .await
    .map_err(store_err)?;
  Ok(Json(json!({ "ok": true })))
}
