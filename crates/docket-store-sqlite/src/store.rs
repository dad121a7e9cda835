//! [`SqliteStore`] — the SQLite implementation of [`ScheduleStore`].
//!
//! Every write that could book a lawyer's slot (create, full update,
//! confirm) runs its referential checks, the overlap check, and the write
//! inside one `call` closure and one SQL transaction. The connection is
//! single and serialized, so the check-then-write pair is atomic with
//! respect to every other store call.

use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use docket_core::{
  appointment::{Appointment, AppointmentStatus, NewAppointment, Transition},
  directory::{Case, CaseRef, Client, Lawyer, NewCase, NewClient, NewLawyer},
  store::{AppointmentPage, AppointmentQuery, ScheduleStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAppointment, RawAppointmentRow, encode_dt, encode_naive, encode_uuid,
  },
  schema::SCHEMA,
};

/// A domain-level outcome carried out of a `call` closure. Database errors
/// travel on the outer result; validation/not-found/conflict on the inner.
type Domain<T> = std::result::Result<T, docket_core::Error>;

fn not_found<T, E>(entity: &'static str) -> std::result::Result<Domain<T>, E> {
  Ok(Err(docket_core::Error::NotFound(entity)))
}

// ─── SQL helpers ─────────────────────────────────────────────────────────────

/// `IN (...)` list of booking-impacting statuses, derived from the single
/// classification point in `docket-core`.
fn booking_impacting_list() -> String {
  AppointmentStatus::ALL
    .iter()
    .filter(|s| s.is_booking_impacting())
    .map(|s| format!("'{}'", s.as_str()))
    .collect::<Vec<_>>()
    .join(", ")
}

/// The half-open interval test from the scheduler contract: two intervals
/// `[s1,e1)` and `[s2,e2)` do not overlap iff `e1 <= s2 OR s1 >= e2`.
/// Only active rows with booking-impacting status count; `exclude` removes
/// a row so an appointment never conflicts with itself.
fn conflict_exists(
  conn:      &rusqlite::Connection,
  lawyer_id: &str,
  start_at:  &str,
  end_at:    &str,
  exclude:   Option<&str>,
) -> rusqlite::Result<bool> {
  let sql = format!(
    "SELECT 1 FROM appointments a
     WHERE a.deleted_at IS NULL
       AND a.status IN ({statuses})
       AND a.lawyer_id = ?1
       AND NOT (a.end_at <= ?2 OR a.start_at >= ?3)
       AND (?4 IS NULL OR a.appointment_id <> ?4)
     LIMIT 1",
    statuses = booking_impacting_list(),
  );
  let hit: Option<bool> = conn
    .query_row(
      &sql,
      rusqlite::params![lawyer_id, start_at, end_at, exclude],
      |_| Ok(true),
    )
    .optional()?;
  Ok(hit.unwrap_or(false))
}

fn active_client_exists(
  conn: &rusqlite::Connection,
  id:   &str,
) -> rusqlite::Result<bool> {
  let hit: Option<bool> = conn
    .query_row(
      "SELECT 1 FROM clients WHERE client_id = ?1 AND deleted_at IS NULL",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()?;
  Ok(hit.unwrap_or(false))
}

fn active_lawyer_exists(
  conn: &rusqlite::Connection,
  id:   &str,
) -> rusqlite::Result<bool> {
  let hit: Option<bool> = conn
    .query_row(
      "SELECT 1 FROM lawyers WHERE lawyer_id = ?1 AND deleted_at IS NULL",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()?;
  Ok(hit.unwrap_or(false))
}

fn active_case_owner(
  conn: &rusqlite::Connection,
  id:   &str,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT client_id FROM cases WHERE case_id = ?1 AND deleted_at IS NULL",
      rusqlite::params![id],
      |row| row.get(0),
    )
    .optional()
}

/// Validate an appointment's references against the directory tables and
/// run the overlap check when the input books a lawyer's slot. Returns the
/// first failure, or `Ok` when the write may proceed.
fn check_references_and_overlap(
  conn:    &rusqlite::Connection,
  input:   &NewAppointment,
  exclude: Option<&str>,
) -> rusqlite::Result<Domain<()>> {
  if !active_client_exists(conn, &encode_uuid(input.client_id))? {
    return not_found("client");
  }

  if let Some(case_id) = input.case_id {
    match active_case_owner(conn, &encode_uuid(case_id))? {
      None => return not_found("case"),
      Some(owner) if owner != encode_uuid(input.client_id) => {
        return Ok(Err(docket_core::Error::validation(
          "case_id",
          "case_id does not belong to client_id",
        )));
      }
      Some(_) => {}
    }
  }

  if let Some(lawyer_id) = input.lawyer_id {
    let lawyer_str = encode_uuid(lawyer_id);
    if !active_lawyer_exists(conn, &lawyer_str)? {
      return not_found("lawyer");
    }
    if input.status.is_booking_impacting()
      && conflict_exists(
        conn,
        &lawyer_str,
        &encode_naive(input.start_at),
        &encode_naive(input.end_at),
        exclude,
      )?
    {
      return Ok(Err(docket_core::Error::overlap()));
    }
  }

  Ok(Ok(()))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket scheduling store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ScheduleStore impl ──────────────────────────────────────────────────────

impl ScheduleStore for SqliteStore {
  type Error = Error;

  // ── Appointments ──────────────────────────────────────────────────────────

  async fn create_appointment(
    &self,
    input: NewAppointment,
  ) -> Result<Appointment> {
    let now = Utc::now();
    let appointment = Appointment {
      id:         Uuid::new_v4(),
      client_id:  input.client_id,
      case_id:    input.case_id,
      lawyer_id:  input.lawyer_id,
      start_at:   input.start_at,
      end_at:     input.end_at,
      channel:    input.channel,
      status:     input.status,
      title:      input.title.clone(),
      notes:      input.notes.clone(),
      created_at: now,
      updated_at: now,
    };

    let id_str        = encode_uuid(appointment.id);
    let client_str    = encode_uuid(input.client_id);
    let case_str      = input.case_id.map(encode_uuid);
    let lawyer_str    = input.lawyer_id.map(encode_uuid);
    let start_str     = encode_naive(input.start_at);
    let end_str       = encode_naive(input.end_at);
    let channel_str   = input.channel.as_str();
    let status_str    = input.status.as_str();
    let now_str       = encode_dt(now);

    let outcome: Domain<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        match check_references_and_overlap(&tx, &input, None)? {
          Err(e) => return Ok(Err(e)),
          Ok(()) => {}
        }

        tx.execute(
          "INSERT INTO appointments (
             appointment_id, client_id, case_id, lawyer_id,
             start_at, end_at, channel, status, title, notes,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            id_str,
            client_str,
            case_str,
            lawyer_str,
            start_str,
            end_str,
            channel_str,
            status_str,
            input.title,
            input.notes,
            now_str,
          ],
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome?;
    Ok(appointment)
  }

  async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM appointments
           WHERE appointment_id = ?1 AND deleted_at IS NULL",
          RawAppointment::COLUMNS,
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawAppointment::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn update_appointment(
    &self,
    id: Uuid,
    input: NewAppointment,
  ) -> Result<Appointment> {
    let now = Utc::now();

    let id_str      = encode_uuid(id);
    let client_str  = encode_uuid(input.client_id);
    let case_str    = input.case_id.map(encode_uuid);
    let lawyer_str  = input.lawyer_id.map(encode_uuid);
    let start_str   = encode_naive(input.start_at);
    let end_str     = encode_naive(input.end_at);
    let channel_str = input.channel.as_str();
    let status_str  = input.status.as_str();
    let now_str     = encode_dt(now);

    let input_for_result = input.clone();
    let exclude_str = id_str.clone();

    let outcome: Domain<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let created_at: Option<String> = tx
          .query_row(
            "SELECT created_at FROM appointments
             WHERE appointment_id = ?1 AND deleted_at IS NULL",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(created_at) = created_at else {
          return not_found("appointment");
        };

        match check_references_and_overlap(&tx, &input, Some(&exclude_str))? {
          Err(e) => return Ok(Err(e)),
          Ok(()) => {}
        }

        tx.execute(
          "UPDATE appointments SET
             client_id = ?2, case_id = ?3, lawyer_id = ?4,
             start_at = ?5, end_at = ?6, channel = ?7, status = ?8,
             title = ?9, notes = ?10, updated_at = ?11
           WHERE appointment_id = ?1 AND deleted_at IS NULL",
          rusqlite::params![
            id_str,
            client_str,
            case_str,
            lawyer_str,
            start_str,
            end_str,
            channel_str,
            status_str,
            input.title,
            input.notes,
            now_str,
          ],
        )?;

        tx.commit()?;
        Ok(Ok(created_at))
      })
      .await?;

    let created_at = crate::encode::decode_dt(&outcome?)?;
    Ok(Appointment {
      id,
      client_id:  input_for_result.client_id,
      case_id:    input_for_result.case_id,
      lawyer_id:  input_for_result.lawyer_id,
      start_at:   input_for_result.start_at,
      end_at:     input_for_result.end_at,
      channel:    input_for_result.channel,
      status:     input_for_result.status,
      title:      input_for_result.title,
      notes:      input_for_result.notes,
      created_at,
      updated_at: now,
    })
  }

  async fn transition_appointment(
    &self,
    id: Uuid,
    transition: Transition,
  ) -> Result<Appointment> {
    let now = Utc::now();
    let id_str = encode_uuid(id);
    let now_str = encode_dt(now);
    let target = transition.target();

    let outcome: Domain<RawAppointment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let sql = format!(
          "SELECT {} FROM appointments
           WHERE appointment_id = ?1 AND deleted_at IS NULL",
          RawAppointment::COLUMNS,
        );
        let raw: Option<RawAppointment> = tx
          .query_row(&sql, rusqlite::params![id_str], RawAppointment::from_row)
          .optional()?;
        let Some(mut raw) = raw else {
          return not_found("appointment");
        };

        // Confirming books the slot for real: guard against another
        // appointment having taken it since this one was scheduled.
        if transition.rechecks_overlap()
          && let Some(lawyer_id) = &raw.lawyer_id
          && conflict_exists(
            &tx,
            lawyer_id,
            &raw.start_at,
            &raw.end_at,
            Some(&id_str),
          )?
        {
          return Ok(Err(docket_core::Error::overlap()));
        }

        tx.execute(
          "UPDATE appointments SET status = ?2, updated_at = ?3
           WHERE appointment_id = ?1 AND deleted_at IS NULL",
          rusqlite::params![id_str, target.as_str(), now_str],
        )?;

        tx.commit()?;
        raw.status = target.as_str().to_owned();
        raw.updated_at = now_str.clone();
        Ok(Ok(raw))
      })
      .await?;

    outcome?.into_appointment()
  }

  async fn soft_delete_appointment(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let changes: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE appointments SET deleted_at = ?2, updated_at = ?2
           WHERE appointment_id = ?1 AND deleted_at IS NULL",
          rusqlite::params![id_str, now_str],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(docket_core::Error::NotFound("appointment").into());
    }
    Ok(())
  }

  async fn list_appointments(
    &self,
    query: &AppointmentQuery,
  ) -> Result<AppointmentPage> {
    let from_str   = query.from.map(encode_naive);
    let to_str     = query.to.map(encode_naive);
    let status_str = query.status.map(|s| s.as_str().to_owned());
    let client_str = query.client_id.map(encode_uuid);
    let case_str   = query.case_id.map(encode_uuid);
    let lawyer_str = query.lawyer_id.map(encode_uuid);
    let sort_col   = query.sort.column();
    let dir_kw     = query.dir.keyword();
    let page       = query.page();
    let limit      = query.limit();
    let limit_val  = i64::from(limit);
    let offset_val = i64::from(query.offset());

    let (total, raws): (i64, Vec<RawAppointmentRow>) = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; `?` placeholders bind in the
        // order the conditions are pushed.
        let mut conds: Vec<&'static str> = vec!["a.deleted_at IS NULL"];
        let mut binds: Vec<&dyn rusqlite::ToSql> = Vec::new();

        if let Some(v) = &from_str {
          conds.push("a.start_at >= ?");
          binds.push(v);
        }
        if let Some(v) = &to_str {
          conds.push("a.start_at < ?");
          binds.push(v);
        }
        if let Some(v) = &status_str {
          conds.push("a.status = ?");
          binds.push(v);
        }
        if let Some(v) = &client_str {
          conds.push("a.client_id = ?");
          binds.push(v);
        }
        if let Some(v) = &case_str {
          conds.push("a.case_id = ?");
          binds.push(v);
        }
        if let Some(v) = &lawyer_str {
          conds.push("a.lawyer_id = ?");
          binds.push(v);
        }

        let where_sql = conds.join(" AND ");

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM appointments a WHERE {where_sql}"),
          &binds[..],
          |row| row.get(0),
        )?;

        let sql = format!(
          "SELECT
             a.appointment_id, a.client_id, a.case_id, a.lawyer_id,
             a.start_at, a.end_at, a.channel, a.status, a.title, a.notes,
             a.created_at, a.updated_at,
             cl.full_name AS client_name,
             c.title      AS case_title,
             lw.full_name AS lawyer_name
           FROM appointments a
           LEFT JOIN clients cl
             ON cl.client_id = a.client_id AND cl.deleted_at IS NULL
           LEFT JOIN cases c
             ON c.case_id = a.case_id AND c.deleted_at IS NULL
           LEFT JOIN lawyers lw
             ON lw.lawyer_id = a.lawyer_id AND lw.deleted_at IS NULL
           WHERE {where_sql}
           ORDER BY a.{sort_col} {dir_kw}
           LIMIT ? OFFSET ?"
        );

        binds.push(&limit_val);
        binds.push(&offset_val);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(&binds[..], |row| {
            Ok(RawAppointmentRow {
              appointment: RawAppointment::from_row(row)?,
              client_name: row.get(12)?,
              case_title:  row.get(13)?,
              lawyer_name: row.get(14)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawAppointmentRow::into_row)
      .collect::<Result<Vec<_>>>()?;

    Ok(AppointmentPage { page, limit, total: total as u64, items })
  }

  async fn has_conflict(
    &self,
    lawyer_id: Uuid,
    start_at: NaiveDateTime,
    end_at: NaiveDateTime,
    exclude: Option<Uuid>,
  ) -> Result<bool> {
    let lawyer_str  = encode_uuid(lawyer_id);
    let start_str   = encode_naive(start_at);
    let end_str     = encode_naive(end_at);
    let exclude_str = exclude.map(encode_uuid);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conflict_exists(
            conn,
            &lawyer_str,
            &start_str,
            &end_str,
            exclude_str.as_deref(),
          )?)
        })
        .await?,
    )
  }

  // ── Directory ──────────────────────────────────────────────────────────────

  async fn add_client(&self, input: NewClient) -> Result<Client> {
    let client = Client {
      id:         Uuid::new_v4(),
      full_name:  input.full_name,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(client.id);
    let name     = client.full_name.clone();
    let at_str   = encode_dt(client.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO clients (client_id, full_name, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(client)
  }

  async fn client_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| Ok(active_client_exists(conn, &id_str)?))
        .await?,
    )
  }

  async fn soft_delete_client(&self, id: Uuid) -> Result<()> {
    self.soft_delete_party("clients", "client_id", "client", id).await
  }

  async fn add_case(&self, input: NewCase) -> Result<Case> {
    let case = Case {
      id:         Uuid::new_v4(),
      client_id:  input.client_id,
      title:      input.title,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(case.id);
    let client_str = encode_uuid(case.client_id);
    let title      = case.title.clone();
    let at_str     = encode_dt(case.created_at);

    let outcome: Domain<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !active_client_exists(&tx, &client_str)? {
          return not_found("client");
        }
        tx.execute(
          "INSERT INTO cases (case_id, client_id, title, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, client_str, title, at_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome?;
    Ok(case)
  }

  async fn get_case(&self, id: Uuid) -> Result<Option<CaseRef>> {
    let id_str = encode_uuid(id);

    let owner: Option<String> = self
      .conn
      .call(move |conn| Ok(active_case_owner(conn, &id_str)?))
      .await?;

    owner
      .map(|client_id| {
        Ok(CaseRef { id, client_id: crate::encode::decode_uuid(&client_id)? })
      })
      .transpose()
  }

  async fn soft_delete_case(&self, id: Uuid) -> Result<()> {
    self.soft_delete_party("cases", "case_id", "case", id).await
  }

  async fn add_lawyer(&self, input: NewLawyer) -> Result<Lawyer> {
    let lawyer = Lawyer {
      id:         Uuid::new_v4(),
      full_name:  input.full_name,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(lawyer.id);
    let name   = lawyer.full_name.clone();
    let at_str = encode_dt(lawyer.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO lawyers (lawyer_id, full_name, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(lawyer)
  }

  async fn lawyer_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| Ok(active_lawyer_exists(conn, &id_str)?))
        .await?,
    )
  }

  async fn soft_delete_lawyer(&self, id: Uuid) -> Result<()> {
    self.soft_delete_party("lawyers", "lawyer_id", "lawyer", id).await
  }
}

impl SqliteStore {
  /// Shared soft-delete for directory tables; the entity name feeds the
  /// `NOT_FOUND` message.
  async fn soft_delete_party(
    &self,
    table:  &'static str,
    id_col: &'static str,
    entity: &'static str,
    id:     Uuid,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let changes: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "UPDATE {table} SET deleted_at = ?2
             WHERE {id_col} = ?1 AND deleted_at IS NULL"
          ),
          rusqlite::params![id_str, now_str],
        )?)
      })
      .await?;

    if changes == 0 {
      return Err(docket_core::Error::NotFound(entity).into());
    }
    Ok(())
  }
}
