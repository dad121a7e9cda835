//! JSON REST API for Docket.
//!
//! Exposes an axum [`Router`] backed by any [`docket_core::store::ScheduleStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", docket_api::api_router(store.clone()))
//! ```

pub mod appointments;
pub mod directory;
pub mod error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use docket_core::store::ScheduleStore;
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Server configuration, deserialised from `config.toml` plus `DOCKET_*`
/// environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// SQLite database path; `:memory:` for an ephemeral store.
  pub store_path: PathBuf,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ScheduleStore + Send + Sync + 'static,
{
  Router::new()
    // Appointments
    .route(
      "/appointments",
      get(appointments::list::<S>).post(appointments::create::<S>),
    )
    .route(
      "/appointments/{id}",
      get(appointments::get_one::<S>)
        .put(appointments::update::<S>)
        .delete(appointments::soft_delete::<S>),
    )
    .route("/appointments/{id}/confirm", post(appointments::confirm::<S>))
    .route("/appointments/{id}/cancel", post(appointments::cancel::<S>))
    .route("/appointments/{id}/mark-done", post(appointments::mark_done::<S>))
    .route("/appointments/{id}/no-show", post(appointments::no_show::<S>))
    // Directory
    .route("/clients", post(directory::create_client::<S>))
    .route("/clients/{id}", delete(directory::delete_client::<S>))
    .route("/cases", post(directory::create_case::<S>))
    .route("/cases/{id}", delete(directory::delete_case::<S>))
    .route("/lawyers", post(directory::create_lawyer::<S>))
    .route("/lawyers/{id}", delete(directory::delete_lawyer::<S>))
    .with_state(store)
}

// ─── Integration tests ───────────────────────────────────────────────────────
