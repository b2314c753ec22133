//! The attendance transition engine.
//!
//! The engine — not the caller — decides whether the next valid action for
//! a subject today is a check-in or a check-out, by reading the record
//! state immediately before attempting the transition. A caller-supplied
//! action is only a hint and is re-validated against that fresh read.
//!
//! Correctness under races does not rest on the read: two sessions can
//! both derive `CheckIn` for the same subject, and then exactly one of the
//! two conditional writes succeeds. The loser surfaces a conflict error
//! rather than silently retrying, since retrying a check-in after
//! `AlreadyMarked` would be semantically wrong.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  attendance::{AttendanceAction, AttendanceRecord, DayState},
  store::{AttendanceStore, CheckoutOutcome, InsertOutcome},
};

/// A successful transition, carrying the record as stored.
#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceOutcome {
  CheckedIn(AttendanceRecord),
  CheckedOut(AttendanceRecord),
}

impl AttendanceOutcome {
  pub fn record(&self) -> &AttendanceRecord {
    match self {
      Self::CheckedIn(r) | Self::CheckedOut(r) => r,
    }
  }

  pub fn action(&self) -> AttendanceAction {
    match self {
      Self::CheckedIn(_) => AttendanceAction::CheckIn,
      Self::CheckedOut(_) => AttendanceAction::CheckOut,
    }
  }
}

/// Engine failure: either a domain conflict or a backend fault.
#[derive(Debug, Error)]
pub enum EngineError<E: std::error::Error> {
  #[error(transparent)]
  Attendance(crate::Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

/// Perform the one valid attendance transition for `(subject_id, date)`.
///
/// `hint` is the action the caller believes is next (e.g. what its screen
/// showed when the capture started); if it no longer matches the freshly
/// read state the call fails with `StaleAction` instead of applying the
/// wrong transition.
pub async fn mark_attendance<S: AttendanceStore>(
  store: &S,
  subject_id: Uuid,
  date: NaiveDate,
  time: NaiveTime,
  hint: Option<AttendanceAction>,
) -> Result<AttendanceOutcome, EngineError<S::Error>> {
  let record = store
    .day_record(subject_id, date)
    .await
    .map_err(EngineError::Store)?;

  let state = DayState::of(record.as_ref());
  let Some(action) = state.next_action() else {
    return Err(EngineError::Attendance(crate::Error::DayComplete {
      subject_id,
      date,
    }));
  };

  if let Some(requested) = hint
    && requested != action
  {
    return Err(EngineError::Attendance(crate::Error::StaleAction {
      expected: action,
      requested,
    }));
  }

  match action {
    AttendanceAction::CheckIn => {
      match store
        .insert_if_absent(subject_id, date, time)
        .await
        .map_err(EngineError::Store)?
      {
        InsertOutcome::Inserted(r) => Ok(AttendanceOutcome::CheckedIn(r)),
        // Lost the race to another session between the read and the write.
        InsertOutcome::DuplicateDay => {
          Err(EngineError::Attendance(crate::Error::AlreadyMarked {
            subject_id,
            date,
          }))
        }
      }
    }
    AttendanceAction::CheckOut => {
      match store
        .complete_if_open(subject_id, date, time)
        .await
        .map_err(EngineError::Store)?
      {
        CheckoutOutcome::Completed(r) => Ok(AttendanceOutcome::CheckedOut(r)),
        CheckoutOutcome::NoOpenRecord => {
          Err(EngineError::Attendance(crate::Error::NoOpenSession {
            subject_id,
            date,
          }))
        }
      }
    }
  }
}
