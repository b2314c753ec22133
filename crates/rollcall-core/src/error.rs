//! Error types for `rollcall-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::attendance::AttendanceAction;

#[derive(Debug, Error)]
pub enum Error {
  #[error("embedding has {got} components, expected {expected}")]
  Dimension { expected: usize, got: usize },

  #[error("subject {subject_id} already checked in on {date}")]
  AlreadyMarked { subject_id: Uuid, date: NaiveDate },

  #[error("subject {subject_id} has no open attendance record on {date}")]
  NoOpenSession { subject_id: Uuid, date: NaiveDate },

  #[error(
    "subject {subject_id} already completed attendance on {date}; no further action is valid"
  )]
  DayComplete { subject_id: Uuid, date: NaiveDate },

  #[error(
    "requested {requested} but the current record state requires {expected}"
  )]
  StaleAction {
    expected:  AttendanceAction,
    requested: AttendanceAction,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
