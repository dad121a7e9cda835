//! Directory records — clients, cases, and lawyers.
//!
//! The scheduler treats these as external collaborators: it only ever asks
//! "does this id resolve to an active record" (plus case ownership). The
//! thin create/soft-delete surface exists so the system is operable; none
//! of it carries scheduling logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An active client of the firm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub id:         Uuid,
  pub full_name:  String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
  pub full_name: String,
}

/// A legal case, owned by exactly one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
  pub id:         Uuid,
  pub client_id:  Uuid,
  pub title:      String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCase {
  pub client_id: Uuid,
  pub title:     String,
}

/// The slice of a case the scheduler needs for its ownership check.
#[derive(Debug, Clone, Copy)]
pub struct CaseRef {
  pub id:        Uuid,
  pub client_id: Uuid,
}

/// A lawyer whose calendar is subject to the no-overlap invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lawyer {
  pub id:         Uuid,
  pub full_name:  String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLawyer {
  pub full_name: String,
}
