//! Attendance types — one record per subject per calendar date.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a day's record. `Present` after check-in, `Completed` once the
/// check-out time is set; a completed record is terminal for that date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
  Present,
  Completed,
}

/// One subject's attendance for one calendar date.
///
/// Keyed by `(subject_id, date)` — unique in the store. `check_in_time` is
/// set once at creation; `check_out_time` is set once by the check-out
/// transition and only while it is still null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub subject_id:     Uuid,
  pub date:           NaiveDate,
  pub check_in_time:  NaiveTime,
  pub check_out_time: Option<NaiveTime>,
  pub status:         AttendanceStatus,
}

/// The two transitions a subject can perform on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceAction {
  CheckIn,
  CheckOut,
}

impl fmt::Display for AttendanceAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::CheckIn => write!(f, "check-in"),
      Self::CheckOut => write!(f, "check-out"),
    }
  }
}

/// The per-day state machine: `Unmarked → CheckedIn → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
  Unmarked,
  CheckedIn,
  Completed,
}

impl DayState {
  /// Derive the state from a freshly read record (or its absence).
  pub fn of(record: Option<&AttendanceRecord>) -> Self {
    match record {
      None => Self::Unmarked,
      Some(r) if r.check_out_time.is_none() => Self::CheckedIn,
      Some(_) => Self::Completed,
    }
  }

  /// The only valid next transition, or `None` once the day is terminal.
  pub fn next_action(self) -> Option<AttendanceAction> {
    match self {
      Self::Unmarked => Some(AttendanceAction::CheckIn),
      Self::CheckedIn => Some(AttendanceAction::CheckOut),
      Self::Completed => None,
    }
  }
}
