//! Subject — an identity enrolled for attendance.
//!
//! A subject owns one or more embeddings. It is created at enrollment and
//! never mutated except to append embeddings; deletion is an administrative
//! action outside this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embedding::Embedding;

/// An enrolled identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:   Uuid,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

/// One subject together with every embedding captured for it.
///
/// The matcher scores a subject by the minimum distance over all of its
/// embeddings, so re-enrollment only ever tightens a match.
#[derive(Debug, Clone)]
pub struct EnrolledSubject {
  pub subject_id:   Uuid,
  pub display_name: String,
  pub embeddings:   Vec<Embedding>,
}

/// A read snapshot of every enrolled subject's embeddings.
///
/// Fetched per matching call; the matcher never assumes the set is static
/// across the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentSet {
  pub subjects: Vec<EnrolledSubject>,
}

impl EnrollmentSet {
  pub fn is_empty(&self) -> bool { self.subjects.is_empty() }

  pub fn len(&self) -> usize { self.subjects.len() }
}
