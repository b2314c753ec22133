//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveTime};
use rollcall_core::{
  attendance::{AttendanceAction, AttendanceStatus},
  engine::{mark_attendance, AttendanceOutcome, EngineError},
  matcher::{find_match, MatchOutcome, DEFAULT_THRESHOLD},
  store::{AttendanceStore, CheckoutOutcome, EnrollmentStore, InsertOutcome},
  Embedding, EMBEDDING_DIM,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(s: &str) -> NaiveDate { s.parse().expect("date") }

fn time(s: &str) -> NaiveTime { s.parse().expect("time") }

fn vector(fill: f32) -> Embedding {
  Embedding::new(vec![fill; EMBEDDING_DIM]).expect("embedding")
}

// ─── Subjects & enrollment ───────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;

  let subject = s.add_subject("Amina Yusuf").await.unwrap();
  assert_eq!(subject.display_name, "Amina Yusuf");

  let fetched = s.get_subject(subject.subject_id).await.unwrap();
  assert!(fetched.is_some());
  assert_eq!(fetched.unwrap().subject_id, subject.subject_id);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  let result = s.get_subject(Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_subjects_all() {
  let s = store().await;
  s.add_subject("A").await.unwrap();
  s.add_subject("B").await.unwrap();
  s.add_subject("C").await.unwrap();

  let all = s.list_subjects().await.unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn insert_embedding_unknown_subject_errors() {
  let s = store().await;
  let missing = Uuid::new_v4();

  let err = s.insert_embedding(missing, vector(0.1)).await.unwrap_err();
  assert!(matches!(err, crate::Error::SubjectNotFound(id) if id == missing));
}

#[tokio::test]
async fn enrollment_round_trip_matches_enrolled_vector() {
  let s = store().await;
  let subject = s.add_subject("Amina Yusuf").await.unwrap();
  let enrolled = vector(0.2);
  s.insert_embedding(subject.subject_id, enrolled.clone())
    .await
    .unwrap();

  let set = s.fetch_enrollment().await.unwrap();
  assert_eq!(set.len(), 1);

  let MatchOutcome::Match(m) =
    find_match(&enrolled, &set, DEFAULT_THRESHOLD).unwrap()
  else {
    panic!("expected the enrolled vector to match");
  };
  assert_eq!(m.subject_id, subject.subject_id);
  assert_eq!(m.distance, 0.0);
  assert_eq!(m.similarity, 100.0);
}

#[tokio::test]
async fn multiple_embeddings_accumulate_per_subject() {
  let s = store().await;
  let subject = s.add_subject("Re-enrolled").await.unwrap();
  s.insert_embedding(subject.subject_id, vector(0.1))
    .await
    .unwrap();
  s.insert_embedding(subject.subject_id, vector(0.9))
    .await
    .unwrap();

  let set = s.fetch_enrollment().await.unwrap();
  assert_eq!(set.subjects[0].embeddings.len(), 2);
}

// ─── Attendance conditional writes ───────────────────────────────────────────

#[tokio::test]
async fn check_in_then_check_out_scenario() {
  let s = store().await;
  let subject = s.add_subject("S1").await.unwrap();
  let day = date("2024-05-01");

  let outcome = s
    .insert_if_absent(subject.subject_id, day, time("08:00:00"))
    .await
    .unwrap();
  let InsertOutcome::Inserted(record) = outcome else {
    panic!("expected an insert");
  };
  assert_eq!(record.check_in_time, time("08:00:00"));
  assert_eq!(record.check_out_time, None);
  assert_eq!(record.status, AttendanceStatus::Present);

  let outcome = s
    .complete_if_open(subject.subject_id, day, time("17:00:00"))
    .await
    .unwrap();
  let CheckoutOutcome::Completed(record) = outcome else {
    panic!("expected a completion");
  };
  assert_eq!(record.check_in_time, time("08:00:00"));
  assert_eq!(record.check_out_time, Some(time("17:00:00")));
  assert_eq!(record.status, AttendanceStatus::Completed);

  // The day is terminal: a further check-out affects zero rows.
  let outcome = s
    .complete_if_open(subject.subject_id, day, time("18:00:00"))
    .await
    .unwrap();
  assert_eq!(outcome, CheckoutOutcome::NoOpenRecord);
}

#[tokio::test]
async fn duplicate_check_in_is_rejected_not_overwritten() {
  let s = store().await;
  let subject = s.add_subject("S1").await.unwrap();
  let day = date("2024-05-01");

  s.insert_if_absent(subject.subject_id, day, time("08:00:00"))
    .await
    .unwrap();
  let outcome = s
    .insert_if_absent(subject.subject_id, day, time("09:30:00"))
    .await
    .unwrap();
  assert_eq!(outcome, InsertOutcome::DuplicateDay);

  // The original record is untouched.
  let record = s
    .day_record(subject.subject_id, day)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(record.check_in_time, time("08:00:00"));
}

#[tokio::test]
async fn check_out_without_check_in_finds_no_open_record() {
  let s = store().await;
  let subject = s.add_subject("S1").await.unwrap();

  let outcome = s
    .complete_if_open(subject.subject_id, date("2024-05-01"), time("17:00:00"))
    .await
    .unwrap();
  assert_eq!(outcome, CheckoutOutcome::NoOpenRecord);
}

#[tokio::test]
async fn concurrent_check_ins_exactly_one_wins() {
  let s = store().await;
  let subject = s.add_subject("Raced").await.unwrap();
  let day = date("2024-05-01");

  let a = s.insert_if_absent(subject.subject_id, day, time("08:00:00"));
  let b = s.insert_if_absent(subject.subject_id, day, time("08:00:01"));
  let (a, b) = tokio::join!(a, b);

  let outcomes = [a.unwrap(), b.unwrap()];
  let wins = outcomes
    .iter()
    .filter(|o| matches!(o, InsertOutcome::Inserted(_)))
    .count();
  let losses = outcomes
    .iter()
    .filter(|o| matches!(o, InsertOutcome::DuplicateDay))
    .count();
  assert_eq!((wins, losses), (1, 1));

  // Exactly one stored record for the day.
  let records = s.records_for_date(day).await.unwrap();
  assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn concurrent_check_outs_exactly_one_wins() {
  let s = store().await;
  let subject = s.add_subject("Raced").await.unwrap();
  let day = date("2024-05-01");
  s.insert_if_absent(subject.subject_id, day, time("08:00:00"))
    .await
    .unwrap();

  let a = s.complete_if_open(subject.subject_id, day, time("17:00:00"));
  let b = s.complete_if_open(subject.subject_id, day, time("17:00:01"));
  let (a, b) = tokio::join!(a, b);

  let outcomes = [a.unwrap(), b.unwrap()];
  let wins = outcomes
    .iter()
    .filter(|o| matches!(o, CheckoutOutcome::Completed(_)))
    .count();
  let losses = outcomes
    .iter()
    .filter(|o| matches!(o, CheckoutOutcome::NoOpenRecord))
    .count();
  assert_eq!((wins, losses), (1, 1));
}

#[tokio::test]
async fn records_for_date_ordered_by_check_in() {
  let s = store().await;
  let day = date("2024-05-01");

  let late = s.add_subject("Late").await.unwrap();
  let early = s.add_subject("Early").await.unwrap();
  s.insert_if_absent(late.subject_id, day, time("09:15:00"))
    .await
    .unwrap();
  s.insert_if_absent(early.subject_id, day, time("07:45:00"))
    .await
    .unwrap();

  let records = s.records_for_date(day).await.unwrap();
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].subject_id, early.subject_id);
  assert_eq!(records[1].subject_id, late.subject_id);
}

// ─── Engine over the real store ──────────────────────────────────────────────

#[tokio::test]
async fn engine_derives_check_in_then_check_out_then_terminal() {
  let s = store().await;
  let subject = s.add_subject("S1").await.unwrap();
  let day = date("2024-05-01");

  let outcome =
    mark_attendance(&s, subject.subject_id, day, time("08:00:00"), None)
      .await
      .unwrap();
  assert!(matches!(outcome, AttendanceOutcome::CheckedIn(_)));

  let outcome =
    mark_attendance(&s, subject.subject_id, day, time("17:00:00"), None)
      .await
      .unwrap();
  let AttendanceOutcome::CheckedOut(record) = outcome else {
    panic!("expected a check-out");
  };
  assert_eq!(record.check_out_time, Some(time("17:00:00")));

  // Third attempt that day: the state machine is terminal.
  let err =
    mark_attendance(&s, subject.subject_id, day, time("18:00:00"), None)
      .await
      .unwrap_err();
  assert!(matches!(
    err,
    EngineError::Attendance(rollcall_core::Error::DayComplete { .. })
  ));
}

#[tokio::test]
async fn engine_rejects_stale_hint() {
  let s = store().await;
  let subject = s.add_subject("S1").await.unwrap();
  let day = date("2024-05-01");

  // The subject was already checked in by another session, so a cached
  // check-in hint is stale.
  s.insert_if_absent(subject.subject_id, day, time("08:00:00"))
    .await
    .unwrap();

  let err = mark_attendance(
    &s,
    subject.subject_id,
    day,
    time("08:05:00"),
    Some(AttendanceAction::CheckIn),
  )
  .await
  .unwrap_err();

  assert!(matches!(
    err,
    EngineError::Attendance(rollcall_core::Error::StaleAction {
      expected:  AttendanceAction::CheckOut,
      requested: AttendanceAction::CheckIn,
    })
  ));
}

#[tokio::test]
async fn engine_race_with_check_in_hint_has_one_winner() {
  let s = store().await;
  let subject = s.add_subject("Raced").await.unwrap();
  let day = date("2024-05-01");
  let hint = Some(AttendanceAction::CheckIn);

  let a = mark_attendance(&s, subject.subject_id, day, time("08:00:00"), hint);
  let b = mark_attendance(&s, subject.subject_id, day, time("08:00:01"), hint);
  let (a, b) = tokio::join!(a, b);

  let ok = [a.is_ok(), b.is_ok()].iter().filter(|v| **v).count();
  assert_eq!(ok, 1, "exactly one concurrent check-in may succeed");

  // The loser sees a specific conflict, depending on whether its read
  // happened before or after the winner's write.
  let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
  assert!(matches!(
    err,
    EngineError::Attendance(
      rollcall_core::Error::AlreadyMarked { .. }
        | rollcall_core::Error::StaleAction { .. }
    )
  ));

  let records = s.records_for_date(day).await.unwrap();
  assert_eq!(records.len(), 1);
}
