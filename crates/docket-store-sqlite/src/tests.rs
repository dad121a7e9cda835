//! Integration tests for `SqliteStore` against an in-memory database.

use docket_core::{
  appointment::{
    AppointmentStatus, Channel, NewAppointment, Transition, parse_time,
  },
  directory::{NewCase, NewClient, NewLawyer},
  store::{AppointmentQuery, ScheduleStore, SortDir, SortKey},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn client(s: &SqliteStore) -> Uuid {
  s.add_client(NewClient { full_name: "Alice Liddell".into() })
    .await
    .unwrap()
    .id
}

async fn lawyer(s: &SqliteStore) -> Uuid {
  s.add_lawyer(NewLawyer { full_name: "Charles Dodgson".into() })
    .await
    .unwrap()
    .id
}

fn slot(
  client_id: Uuid,
  lawyer_id: Option<Uuid>,
  start: &str,
  end: &str,
) -> NewAppointment {
  NewAppointment {
    client_id,
    case_id: None,
    lawyer_id,
    start_at: parse_time(start).unwrap(),
    end_at: parse_time(end).unwrap(),
    channel: Channel::InPerson,
    status: AppointmentStatus::Scheduled,
    title: None,
    notes: None,
  }
}

/// The machine-readable code of a store error.
fn code(e: crate::Error) -> &'static str { docket_core::Error::from(e).code() }

// ─── Create and get ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_roundtrip() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let mut input = slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00");
  input.channel = Channel::Video;
  input.title = Some("Initial consultation".into());

  let created = s.create_appointment(input).await.unwrap();
  let fetched = s.get_appointment(created.id).await.unwrap().unwrap();

  assert_eq!(fetched.id, created.id);
  assert_eq!(fetched.client_id, cl);
  assert_eq!(fetched.lawyer_id, Some(lw));
  assert_eq!(fetched.start_at, parse_time("2024-01-10 09:00:00").unwrap());
  assert_eq!(fetched.end_at, parse_time("2024-01-10 09:30:00").unwrap());
  assert_eq!(fetched.channel, Channel::Video);
  assert_eq!(fetched.status, AppointmentStatus::Scheduled);
  assert_eq!(fetched.title.as_deref(), Some("Initial consultation"));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get_appointment(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Referential checks ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_with_unknown_client_is_not_found() {
  let s = store().await;
  let err = s
    .create_appointment(slot(
      Uuid::new_v4(),
      None,
      "2024-01-10 09:00:00",
      "2024-01-10 09:30:00",
    ))
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

#[tokio::test]
async fn create_with_unknown_lawyer_is_not_found() {
  let s = store().await;
  let cl = client(&s).await;
  let err = s
    .create_appointment(slot(
      cl,
      Some(Uuid::new_v4()),
      "2024-01-10 09:00:00",
      "2024-01-10 09:30:00",
    ))
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

#[tokio::test]
async fn create_with_unknown_case_is_not_found() {
  let s = store().await;
  let cl = client(&s).await;
  let mut input = slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 09:30:00");
  input.case_id = Some(Uuid::new_v4());
  let err = s.create_appointment(input).await.unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

#[tokio::test]
async fn case_must_belong_to_the_appointment_client() {
  let s = store().await;
  let cl = client(&s).await;
  let other = s
    .add_client(NewClient { full_name: "Bob".into() })
    .await
    .unwrap();
  let case = s
    .add_case(NewCase { client_id: other.id, title: "Estate of Bob".into() })
    .await
    .unwrap();

  let mut input = slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 09:30:00");
  input.case_id = Some(case.id);
  let err = s.create_appointment(input).await.unwrap_err();
  assert_eq!(code(err), "VALIDATION_ERROR");

  // The same case works for its actual owner.
  let mut input =
    slot(other.id, None, "2024-01-10 09:00:00", "2024-01-10 09:30:00");
  input.case_id = Some(case.id);
  assert!(s.create_appointment(input).await.is_ok());
}

#[tokio::test]
async fn deleted_directory_records_are_treated_as_missing() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  s.soft_delete_lawyer(lw).await.unwrap();
  let err = s
    .create_appointment(slot(
      cl,
      Some(lw),
      "2024-01-10 09:00:00",
      "2024-01-10 09:30:00",
    ))
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");

  s.soft_delete_client(cl).await.unwrap();
  let err = s
    .create_appointment(slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

// ─── The no-overlap invariant ────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_intervals_conflict_in_all_four_geometries() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();

  // Fully inside, overlapping-start, overlapping-end, identical.
  for (start, end) in [
    ("2024-01-10 09:15:00", "2024-01-10 09:45:00"),
    ("2024-01-10 08:30:00", "2024-01-10 09:30:00"),
    ("2024-01-10 09:30:00", "2024-01-10 10:30:00"),
    ("2024-01-10 09:00:00", "2024-01-10 10:00:00"),
  ] {
    let err = s
      .create_appointment(slot(cl, Some(lw), start, end))
      .await
      .unwrap_err();
    assert_eq!(code(err), "CONFLICT", "expected conflict for [{start}, {end})");
  }
}

#[tokio::test]
async fn different_lawyer_same_slot_is_fine() {
  let s = store().await;
  let cl = client(&s).await;
  let lw1 = lawyer(&s).await;
  let lw2 = lawyer(&s).await;

  s.create_appointment(slot(cl, Some(lw1), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();
  s.create_appointment(slot(cl, Some(lw2), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();
}

#[tokio::test]
async fn unassigned_appointments_never_conflict() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();

  // No lawyer: same slot twice, both fine.
  s.create_appointment(slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();
  s.create_appointment(slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();
}

#[tokio::test]
async fn back_to_back_slots_do_not_conflict() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  // end == next start: half-open intervals touch but do not overlap.
  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:30:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();
}

#[tokio::test]
async fn terminal_status_rows_do_not_block_the_slot() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let mut backfill =
    slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00");
  backfill.status = AppointmentStatus::Done;
  s.create_appointment(backfill).await.unwrap();

  // The done row occupies no slot.
  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();
}

#[tokio::test]
async fn cancelling_frees_the_slot() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();

  let err = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:15:00", "2024-01-10 09:45:00"))
    .await
    .unwrap_err();
  assert_eq!(code(err), "CONFLICT");

  s.transition_appointment(a.id, Transition::Cancel).await.unwrap();

  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:15:00", "2024-01-10 09:45:00"))
    .await
    .unwrap();
}

#[tokio::test]
async fn has_conflict_honours_exclusion() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();

  let start = parse_time("2024-01-10 09:00:00").unwrap();
  let end = parse_time("2024-01-10 10:00:00").unwrap();

  assert!(s.has_conflict(lw, start, end, None).await.unwrap());
  // Excluding the row itself: no other booking intersects.
  assert!(!s.has_conflict(lw, start, end, Some(a.id)).await.unwrap());
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn confirm_flips_status() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();

  let confirmed = s
    .transition_appointment(a.id, Transition::Confirm)
    .await
    .unwrap();
  assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn confirm_fails_when_the_slot_was_since_taken() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  // A terminal-status backfill occupies no slot, so B can be booked over
  // it. Confirming the backfill afterwards must then fail: its interval
  // now intersects a live booking.
  let mut backfill =
    slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00");
  backfill.status = AppointmentStatus::Cancelled;
  let a = s.create_appointment(backfill).await.unwrap();

  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();

  let err = s
    .transition_appointment(a.id, Transition::Confirm)
    .await
    .unwrap_err();
  assert_eq!(code(err), "CONFLICT");

  // No mutation on conflict.
  let unchanged = s.get_appointment(a.id).await.unwrap().unwrap();
  assert_eq!(unchanged.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn mark_done_and_no_show_are_unconditional() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  let b = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:30:00", "2024-01-10 10:00:00"))
    .await
    .unwrap();

  let done = s
    .transition_appointment(a.id, Transition::MarkDone)
    .await
    .unwrap();
  assert_eq!(done.status, AppointmentStatus::Done);

  let no_show = s
    .transition_appointment(b.id, Transition::MarkNoShow)
    .await
    .unwrap();
  assert_eq!(no_show.status, AppointmentStatus::NoShow);
}

#[tokio::test]
async fn transition_on_missing_row_is_not_found() {
  let s = store().await;
  let err = s
    .transition_appointment(Uuid::new_v4(), Transition::Cancel)
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_replaces_fields_and_excludes_self_from_overlap() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();

  // Same interval, new title: must not conflict with itself.
  let mut input = slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00");
  input.title = Some("Rescheduled intake".into());
  let updated = s.update_appointment(a.id, input).await.unwrap();

  assert_eq!(updated.id, a.id);
  assert_eq!(updated.title.as_deref(), Some("Rescheduled intake"));
  assert_eq!(updated.created_at, a.created_at);
  assert!(updated.updated_at >= a.updated_at);
}

#[tokio::test]
async fn update_into_an_occupied_slot_conflicts() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  let b = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 10:00:00", "2024-01-10 10:30:00"))
    .await
    .unwrap();

  let err = s
    .update_appointment(
      b.id,
      slot(cl, Some(lw), "2024-01-10 09:15:00", "2024-01-10 09:45:00"),
    )
    .await
    .unwrap_err();
  assert_eq!(code(err), "CONFLICT");
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
  let s = store().await;
  let cl = client(&s).await;
  let err = s
    .update_appointment(
      Uuid::new_v4(),
      slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 09:30:00"),
    )
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_hides_row_and_frees_slot() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  s.soft_delete_appointment(a.id).await.unwrap();

  assert!(s.get_appointment(a.id).await.unwrap().is_none());
  let page = s
    .list_appointments(&AppointmentQuery::default())
    .await
    .unwrap();
  assert_eq!(page.total, 0);

  // The slot is free again.
  s.create_appointment(slot(cl, Some(lw), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
}

#[tokio::test]
async fn soft_delete_is_not_repeatable() {
  let s = store().await;
  let cl = client(&s).await;

  let a = s
    .create_appointment(slot(cl, None, "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  s.soft_delete_appointment(a.id).await.unwrap();

  let err = s.soft_delete_appointment(a.id).await.unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_lawyer_status_and_date_window() {
  let s = store().await;
  let cl = client(&s).await;
  let lw1 = lawyer(&s).await;
  let lw2 = lawyer(&s).await;

  let a = s
    .create_appointment(slot(cl, Some(lw1), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  s.create_appointment(slot(cl, Some(lw1), "2024-01-11 09:00:00", "2024-01-11 09:30:00"))
    .await
    .unwrap();
  s.create_appointment(slot(cl, Some(lw2), "2024-01-10 09:00:00", "2024-01-10 09:30:00"))
    .await
    .unwrap();
  s.transition_appointment(a.id, Transition::Confirm).await.unwrap();

  let by_lawyer = s
    .list_appointments(&AppointmentQuery {
      lawyer_id: Some(lw1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_lawyer.total, 2);

  let confirmed = s
    .list_appointments(&AppointmentQuery {
      status: Some(AppointmentStatus::Confirmed),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(confirmed.total, 1);
  assert_eq!(confirmed.items[0].appointment.id, a.id);

  // `to` is exclusive on start_at.
  let day_one = s
    .list_appointments(&AppointmentQuery {
      from: parse_time("2024-01-10 00:00:00"),
      to: parse_time("2024-01-11 00:00:00"),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(day_one.total, 2);
}

#[tokio::test]
async fn list_sorts_and_paginates() {
  let s = store().await;
  let cl = client(&s).await;

  for day in 10..15 {
    s.create_appointment(slot(
      cl,
      None,
      &format!("2024-01-{day} 09:00:00"),
      &format!("2024-01-{day} 09:30:00"),
    ))
    .await
    .unwrap();
  }

  let page1 = s
    .list_appointments(&AppointmentQuery {
      sort: SortKey::StartAt,
      dir: SortDir::Asc,
      page: 1,
      limit: 2,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page1.total, 5);
  assert_eq!(page1.items.len(), 2);
  assert_eq!(
    page1.items[0].appointment.start_at,
    parse_time("2024-01-10 09:00:00").unwrap()
  );

  let page3 = s
    .list_appointments(&AppointmentQuery {
      sort: SortKey::StartAt,
      dir: SortDir::Asc,
      page: 3,
      limit: 2,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page3.items.len(), 1);
  assert_eq!(
    page3.items[0].appointment.start_at,
    parse_time("2024-01-14 09:00:00").unwrap()
  );
}

#[tokio::test]
async fn list_enriches_rows_with_display_names() {
  let s = store().await;
  let cl = s
    .add_client(NewClient { full_name: "Alice Liddell".into() })
    .await
    .unwrap();
  let lw = s
    .add_lawyer(NewLawyer { full_name: "Charles Dodgson".into() })
    .await
    .unwrap();
  let case = s
    .add_case(NewCase { client_id: cl.id, title: "Liddell v. Hearts".into() })
    .await
    .unwrap();

  let mut input =
    slot(cl.id, Some(lw.id), "2024-01-10 09:00:00", "2024-01-10 09:30:00");
  input.case_id = Some(case.id);
  s.create_appointment(input).await.unwrap();

  let page = s
    .list_appointments(&AppointmentQuery::default())
    .await
    .unwrap();
  assert_eq!(page.items.len(), 1);
  let row = &page.items[0];
  assert_eq!(row.client_name.as_deref(), Some("Alice Liddell"));
  assert_eq!(row.case_title.as_deref(), Some("Liddell v. Hearts"));
  assert_eq!(row.lawyer_name.as_deref(), Some("Charles Dodgson"));

  // Deleting the lawyer afterwards drops the name but keeps the row.
  s.soft_delete_lawyer(lw.id).await.unwrap();
  let page = s
    .list_appointments(&AppointmentQuery::default())
    .await
    .unwrap();
  assert_eq!(page.items.len(), 1);
  assert!(page.items[0].lawyer_name.is_none());
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn directory_lookups_respect_soft_delete() {
  let s = store().await;
  let cl = client(&s).await;
  let lw = lawyer(&s).await;
  let case = s
    .add_case(NewCase { client_id: cl, title: "Intake".into() })
    .await
    .unwrap();

  assert!(s.client_exists(cl).await.unwrap());
  assert!(s.lawyer_exists(lw).await.unwrap());
  assert_eq!(s.get_case(case.id).await.unwrap().unwrap().client_id, cl);

  s.soft_delete_client(cl).await.unwrap();
  s.soft_delete_lawyer(lw).await.unwrap();
  s.soft_delete_case(case.id).await.unwrap();

  assert!(!s.client_exists(cl).await.unwrap());
  assert!(!s.lawyer_exists(lw).await.unwrap());
  assert!(s.get_case(case.id).await.unwrap().is_none());
}

#[tokio::test]
async fn add_case_requires_an_active_client() {
  let s = store().await;
  let err = s
    .add_case(NewCase { client_id: Uuid::new_v4(), title: "Orphan".into() })
    .await
    .unwrap_err();
  assert_eq!(code(err), "NOT_FOUND");
}
