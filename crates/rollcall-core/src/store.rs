//! The store traits and the conditional-write outcome types.
//!
//! Implemented by storage backends (e.g. `rollcall-store-sqlite`). Higher
//! layers depend on these abstractions, not on any concrete backend. The
//! two attendance mutations are the only concurrency-control primitives in
//! the system: each must be a single atomic conditional operation in the
//! backing store, never an in-process check followed by a write.

use std::future::Future;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
  attendance::AttendanceRecord,
  embedding::Embedding,
  subject::{EnrollmentSet, Subject},
};

// ─── Conditional-write outcomes ──────────────────────────────────────────────

/// Result of the insert-if-absent check-in write.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
  Inserted(AttendanceRecord),
  /// A record for `(subject_id, date)` already exists; nothing was written.
  DuplicateDay,
}

/// Result of the guarded check-out update.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
  Completed(AttendanceRecord),
  /// The conditional update affected zero rows: either no record exists for
  /// the day, or its check-out time was already set.
  NoOpenRecord,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Enrollment reads and writes.
///
/// All methods return `Send` futures so the traits can be used from
/// multi-threaded async runtimes.
pub trait EnrollmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create and persist a new subject.
  fn add_subject(
    &self,
    display_name: &str,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send;

  /// Retrieve a subject by id. Returns `None` if not found.
  fn get_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// List all enrolled subjects.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Append one embedding to an existing subject.
  fn insert_embedding(
    &self,
    subject_id: Uuid,
    embedding: Embedding,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Read a consistent snapshot of every subject's embeddings for one
  /// matching call.
  fn fetch_enrollment(
    &self,
  ) -> impl Future<Output = Result<EnrollmentSet, Self::Error>> + Send + '_;
}

/// Attendance reads and the two atomic transitions.
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert the day's record if and only if none exists yet. Detection of
  /// an existing record must come from the store's own uniqueness guard,
  /// and the existing record is never overwritten.
  fn insert_if_absent(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
    check_in_time: NaiveTime,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + '_;

  /// Set the check-out time if and only if the day's record is still open
  /// (`check_out_time IS NULL` at apply time).
  fn complete_if_open(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
    check_out_time: NaiveTime,
  ) -> impl Future<Output = Result<CheckoutOutcome, Self::Error>> + Send + '_;

  /// Read the record for one subject and date, if any.
  fn day_record(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// All records for one calendar date.
  fn records_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;
}
