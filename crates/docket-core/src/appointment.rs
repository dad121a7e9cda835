//! Appointment types — the sole entity the scheduler owns.
//!
//! An appointment holds non-owning references (by id) to a client, and
//! optionally a case and a lawyer. Appointments with a lawyer and a
//! booking-impacting status participate in the per-lawyer no-overlap
//! invariant; everything else is inert data.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The fixed textual format for appointment times. No timezone; the format
/// is lexicographically ordered, so string comparison is time comparison.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 240;
pub const MAX_TITLE_CHARS: usize = 120;

/// Parse a timestamp in [`TIME_FORMAT`].
pub fn parse_time(s: &str) -> Option<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT).ok()
}

/// Render a timestamp in [`TIME_FORMAT`].
pub fn format_time(t: NaiveDateTime) -> String {
  t.format(TIME_FORMAT).to_string()
}

/// Serde adapter serialising [`NaiveDateTime`] in [`TIME_FORMAT`].
pub mod timefmt {
  use chrono::NaiveDateTime;
  use serde::{self, Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(t: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    ser.serialize_str(&super::format_time(*t))
  }

  pub fn deserialize<'de, D>(de: D) -> Result<NaiveDateTime, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(de)?;
    super::parse_time(&s).ok_or_else(|| {
      serde::de::Error::custom(format!("invalid timestamp: {s:?}"))
    })
  }
}

// ─── Channel ─────────────────────────────────────────────────────────────────

/// How the appointment is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
  #[default]
  InPerson,
  Phone,
  Video,
}

impl Channel {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::InPerson => "in_person",
      Self::Phone => "phone",
      Self::Video => "video",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "in_person" => Some(Self::InPerson),
      "phone" => Some(Self::Phone),
      "video" => Some(Self::Video),
      _ => None,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle status of an appointment.
///
/// `scheduled` is the initial state; the other four are terminal with
/// respect to this component — there is no transition back to `scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
  #[default]
  Scheduled,
  Confirmed,
  Cancelled,
  Done,
  NoShow,
}

impl AppointmentStatus {
  pub const ALL: [Self; 5] =
    [Self::Scheduled, Self::Confirmed, Self::Cancelled, Self::Done, Self::NoShow];

  /// Whether this status participates in the per-lawyer overlap invariant.
  ///
  /// This is the single classification point: cancelled/done/no_show
  /// appointments never block a new booking at the same slot.
  pub fn is_booking_impacting(self) -> bool {
    matches!(self, Self::Scheduled | Self::Confirmed)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Scheduled => "scheduled",
      Self::Confirmed => "confirmed",
      Self::Cancelled => "cancelled",
      Self::Done => "done",
      Self::NoShow => "no_show",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "scheduled" => Some(Self::Scheduled),
      "confirmed" => Some(Self::Confirmed),
      "cancelled" => Some(Self::Cancelled),
      "done" => Some(Self::Done),
      "no_show" => Some(Self::NoShow),
      _ => None,
    }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// The narrow status-transition shortcuts exposed by the scheduler.
///
/// `Confirm` is guarded by an overlap re-check against the stored interval;
/// the other three vacate or complete a slot and need no re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Confirm,
  Cancel,
  MarkDone,
  MarkNoShow,
}

impl Transition {
  pub fn target(self) -> AppointmentStatus {
    match self {
      Self::Confirm => AppointmentStatus::Confirmed,
      Self::Cancel => AppointmentStatus::Cancelled,
      Self::MarkDone => AppointmentStatus::Done,
      Self::MarkNoShow => AppointmentStatus::NoShow,
    }
  }

  /// Whether flipping to the target status must re-run the overlap check.
  pub fn rechecks_overlap(self) -> bool { matches!(self, Self::Confirm) }
}

// ─── Appointment ─────────────────────────────────────────────────────────────

/// A persisted appointment. Soft-deleted rows are never surfaced, so the
/// deletion marker does not appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
  pub id:         Uuid,
  pub client_id:  Uuid,
  pub case_id:    Option<Uuid>,
  pub lawyer_id:  Option<Uuid>,
  #[serde(with = "timefmt")]
  pub start_at:   NaiveDateTime,
  #[serde(with = "timefmt")]
  pub end_at:     NaiveDateTime,
  pub channel:    Channel,
  pub status:     AppointmentStatus,
  pub title:      Option<String>,
  pub notes:      Option<String>,
  /// Store-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  /// Bumped by the store on every mutation.
  pub updated_at: DateTime<Utc>,
}

// ─── Draft and validated input ───────────────────────────────────────────────

/// Raw caller input for create and full update. Nothing is trusted yet;
/// [`AppointmentDraft::validate`] turns it into a [`NewAppointment`] or a
/// validation error naming the offending field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentDraft {
  pub client_id: Option<Uuid>,
  pub case_id:   Option<Uuid>,
  pub lawyer_id: Option<Uuid>,
  pub start_at:  Option<String>,
  pub end_at:    Option<String>,
  pub channel:   Option<String>,
  pub status:    Option<String>,
  pub title:     Option<String>,
  pub notes:     Option<String>,
}

/// Validated, normalised input to the store. Referential checks (client,
/// case ownership, lawyer) and the overlap check are the store's job —
/// they must run in the same transaction as the write.
#[derive(Debug, Clone)]
pub struct NewAppointment {
  pub client_id: Uuid,
  pub case_id:   Option<Uuid>,
  pub lawyer_id: Option<Uuid>,
  pub start_at:  NaiveDateTime,
  pub end_at:    NaiveDateTime,
  pub channel:   Channel,
  pub status:    AppointmentStatus,
  pub title:     Option<String>,
  pub notes:     Option<String>,
}

fn trim_or_none(v: Option<String>) -> Option<String> {
  v.and_then(|s| {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_owned()) }
  })
}

impl AppointmentDraft {
  /// Apply the full validation contract.
  ///
  /// Checks, in order: `client_id` present; both timestamps parse in
  /// [`TIME_FORMAT`]; `end_at > start_at`; duration within
  /// [15, 240] minutes; known channel and status (defaulting to
  /// `in_person` / `scheduled` when omitted); title length 1..=120.
  pub fn validate(self) -> Result<NewAppointment> {
    let client_id = self
      .client_id
      .ok_or_else(|| Error::validation("client_id", "client_id is required"))?;

    let start_at = self
      .start_at
      .as_deref()
      .and_then(parse_time)
      .ok_or_else(|| {
        Error::validation("start_at", "start_at must be 'YYYY-MM-DD HH:MM:SS'")
      })?;
    let end_at = self.end_at.as_deref().and_then(parse_time).ok_or_else(|| {
      Error::validation("end_at", "end_at must be 'YYYY-MM-DD HH:MM:SS'")
    })?;

    if end_at <= start_at {
      return Err(Error::validation("end_at", "end_at must be after start_at"));
    }
    let duration = end_at - start_at;
    if duration < TimeDelta::minutes(MIN_DURATION_MINUTES)
      || duration > TimeDelta::minutes(MAX_DURATION_MINUTES)
    {
      return Err(Error::validation(
        "end_at",
        format!(
          "appointment duration must be between {MIN_DURATION_MINUTES} and \
           {MAX_DURATION_MINUTES} minutes"
        ),
      ));
    }

    let channel = match trim_or_none(self.channel) {
      None => Channel::default(),
      Some(s) => Channel::parse(&s)
        .ok_or_else(|| Error::validation("channel", "invalid channel"))?,
    };
    let status = match trim_or_none(self.status) {
      None => AppointmentStatus::default(),
      Some(s) => AppointmentStatus::parse(&s)
        .ok_or_else(|| Error::validation("status", "invalid status"))?,
    };

    let title = trim_or_none(self.title);
    if let Some(t) = &title
      && t.chars().count() > MAX_TITLE_CHARS
    {
      return Err(Error::validation(
        "title",
        format!("title must be at most {MAX_TITLE_CHARS} characters"),
      ));
    }

    Ok(NewAppointment {
      client_id,
      case_id: self.case_id,
      lawyer_id: self.lawyer_id,
      start_at,
      end_at,
      channel,
      status,
      title,
      notes: trim_or_none(self.notes),
    })
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(start: &str, end: &str) -> AppointmentDraft {
    AppointmentDraft {
      client_id: Some(Uuid::new_v4()),
      start_at: Some(start.into()),
      end_at: Some(end.into()),
      ..Default::default()
    }
  }

  #[test]
  fn minimal_draft_gets_defaults() {
    let new = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00")
      .validate()
      .unwrap();
    assert_eq!(new.channel, Channel::InPerson);
    assert_eq!(new.status, AppointmentStatus::Scheduled);
    assert!(new.title.is_none());
  }

  #[test]
  fn missing_client_id_is_rejected() {
    let mut d = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00");
    d.client_id = None;
    let err = d.validate().unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert_eq!(err.field(), Some("client_id"));
  }

  #[test]
  fn malformed_timestamps_are_rejected() {
    let err = draft("2024-01-10T09:00", "2024-01-10 09:30:00")
      .validate()
      .unwrap_err();
    assert_eq!(err.field(), Some("start_at"));

    let err = draft("2024-01-10 09:00:00", "next tuesday")
      .validate()
      .unwrap_err();
    assert_eq!(err.field(), Some("end_at"));
  }

  #[test]
  fn end_must_be_after_start() {
    let err = draft("2024-01-10 09:30:00", "2024-01-10 09:30:00")
      .validate()
      .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
  }

  #[test]
  fn duration_boundaries() {
    // 14 minutes: too short.
    assert!(
      draft("2024-01-10 09:00:00", "2024-01-10 09:14:00")
        .validate()
        .is_err()
    );
    // 15 and 240 minutes: exactly in range.
    assert!(
      draft("2024-01-10 09:00:00", "2024-01-10 09:15:00")
        .validate()
        .is_ok()
    );
    assert!(
      draft("2024-01-10 09:00:00", "2024-01-10 13:00:00")
        .validate()
        .is_ok()
    );
    // 241 minutes: too long.
    assert!(
      draft("2024-01-10 09:00:00", "2024-01-10 13:01:00")
        .validate()
        .is_err()
    );
  }

  #[test]
  fn unknown_channel_and_status_are_rejected() {
    let mut d = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00");
    d.channel = Some("telepathy".into());
    assert_eq!(d.validate().unwrap_err().field(), Some("channel"));

    let mut d = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00");
    d.status = Some("pending".into());
    assert_eq!(d.validate().unwrap_err().field(), Some("status"));
  }

  #[test]
  fn title_is_trimmed_and_length_checked() {
    let mut d = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00");
    d.title = Some("   ".into());
    assert!(d.validate().unwrap().title.is_none());

    let mut d = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00");
    d.title = Some("x".repeat(MAX_TITLE_CHARS));
    assert!(d.validate().is_ok());

    let mut d = draft("2024-01-10 09:00:00", "2024-01-10 09:30:00");
    d.title = Some("x".repeat(MAX_TITLE_CHARS + 1));
    assert_eq!(d.validate().unwrap_err().field(), Some("title"));
  }

  #[test]
  fn booking_impacting_statuses() {
    assert!(AppointmentStatus::Scheduled.is_booking_impacting());
    assert!(AppointmentStatus::Confirmed.is_booking_impacting());
    assert!(!AppointmentStatus::Cancelled.is_booking_impacting());
    assert!(!AppointmentStatus::Done.is_booking_impacting());
    assert!(!AppointmentStatus::NoShow.is_booking_impacting());
  }

  #[test]
  fn transition_targets() {
    assert_eq!(Transition::Confirm.target(), AppointmentStatus::Confirmed);
    assert_eq!(Transition::Cancel.target(), AppointmentStatus::Cancelled);
    assert_eq!(Transition::MarkDone.target(), AppointmentStatus::Done);
    assert_eq!(Transition::MarkNoShow.target(), AppointmentStatus::NoShow);
    assert!(Transition::Confirm.rechecks_overlap());
    assert!(!Transition::Cancel.rechecks_overlap());
  }
}
