//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Appointment times are stored in the fixed 'YYYY-MM-DD HH:MM:SS' format;
//! bookkeeping timestamps as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Channel and status are stored as their
//! snake_case discriminants.

use chrono::{DateTime, NaiveDateTime, Utc};
use docket_core::{
  appointment::{
    Appointment, AppointmentStatus, Channel, format_time, parse_time,
  },
  store::AppointmentRow,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_naive(t: NaiveDateTime) -> String { format_time(t) }

pub fn decode_naive(s: &str) -> Result<NaiveDateTime> {
  parse_time(s).ok_or_else(|| Error::Decode(format!("bad appointment time {s:?}")))
}

// ─── Discriminants ───────────────────────────────────────────────────────────

pub fn decode_channel(s: &str) -> Result<Channel> {
  Channel::parse(s).ok_or_else(|| Error::Decode(format!("unknown channel: {s:?}")))
}

pub fn decode_status(s: &str) -> Result<AppointmentStatus> {
  AppointmentStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown status: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `appointments` row.
pub struct RawAppointment {
  pub appointment_id: String,
  pub client_id:      String,
  pub case_id:        Option<String>,
  pub lawyer_id:      Option<String>,
  pub start_at:       String,
  pub end_at:         String,
  pub channel:        String,
  pub status:         String,
  pub title:          Option<String>,
  pub notes:          Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAppointment {
  /// The column list matching [`RawAppointment::from_row`].
  pub const COLUMNS: &'static str = "appointment_id, client_id, case_id, \
     lawyer_id, start_at, end_at, channel, status, title, notes, \
     created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appointment_id: row.get(0)?,
      client_id:      row.get(1)?,
      case_id:        row.get(2)?,
      lawyer_id:      row.get(3)?,
      start_at:       row.get(4)?,
      end_at:         row.get(5)?,
      channel:        row.get(6)?,
      status:         row.get(7)?,
      title:          row.get(8)?,
      notes:          row.get(9)?,
      created_at:     row.get(10)?,
      updated_at:     row.get(11)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      id:         decode_uuid(&self.appointment_id)?,
      client_id:  decode_uuid(&self.client_id)?,
      case_id:    self.case_id.as_deref().map(decode_uuid).transpose()?,
      lawyer_id:  self.lawyer_id.as_deref().map(decode_uuid).transpose()?,
      start_at:   decode_naive(&self.start_at)?,
      end_at:     decode_naive(&self.end_at)?,
      channel:    decode_channel(&self.channel)?,
      status:     decode_status(&self.status)?,
      title:      self.title,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A raw appointment joined with the display names of its referents.
pub struct RawAppointmentRow {
  pub appointment: RawAppointment,
  pub client_name: Option<String>,
  pub case_title:  Option<String>,
  pub lawyer_name: Option<String>,
}

impl RawAppointmentRow {
  pub fn into_row(self) -> Result<AppointmentRow> {
    Ok(AppointmentRow {
      appointment: self.appointment.into_appointment()?,
      client_name: self.client_name,
      case_title:  self.case_title,
      lawyer_name: self.lawyer_name,
    })
  }
}

