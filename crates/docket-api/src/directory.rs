//! Handlers for the directory plumbing — clients, cases, lawyers.
//!
//! Thin record-store surface only: create and soft-delete. The scheduler
//! consumes these records through existence/ownership checks; nothing here
//! carries scheduling logic.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  directory::{NewCase, NewClient, NewLawyer},
  store::ScheduleStore,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, store_err};

fn require_name(
  raw: &str,
  field: &'static str,
) -> Result<String, ApiError> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(ApiError(docket_core::Error::validation(
      field,
      format!("{field} is required"),
    )));
  }
  Ok(name.to_owned())
}

// ─── Clients ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ClientBody {
  pub full_name: String,
}

/// `POST /clients`
pub async fn create_client<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<ClientBody>,
) -> Result<impl IntoResponse, ApiError> {
  let full_name = require_name(&body.full_name, "full_name")?;
  let client = store
    .add_client(NewClient { full_name })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(client)))
}

/// `DELETE /clients/:id` — soft delete.
pub async fn delete_client<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  store.soft_delete_client(id).await.map_err(store_err)?;
  Ok(Json(json!({ "ok": true })))
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CaseBody {
  pub client_id: Uuid,
  pub title:     String,
}

/// `POST /cases`
pub async fn create_case<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CaseBody>,
) -> Result<impl IntoResponse, ApiError> {
  let title = require_name(&body.title, "title")?;
  let case = store
    .add_case(NewCase { client_id: body.client_id, title })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(case)))
}

/// `DELETE /cases/:id` — soft delete.
pub async fn delete_case<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  store.soft_delete_case(id).await.map_err(store_err)?;
  Ok(Json(json!({ "ok": true })))
}

// ─── Lawyers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LawyerBody {
  pub full_name: String,
}

/// `POST /lawyers`
pub async fn create_lawyer<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<LawyerBody>,
) -> Result<impl IntoResponse, ApiError> {
  let full_name = require_name(&body.full_name, "full_name")?;
  let lawyer = store
    .add_lawyer(NewLawyer { full_name })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(lawyer)))
}

/// `DELETE /lawyers/:id` — soft delete.
pub async fn delete_lawyer<S: ScheduleStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  store.soft_delete_lawyer(id).await.map_err(store_err)?;
  Ok(Json(json!({ "ok": true })))
}
