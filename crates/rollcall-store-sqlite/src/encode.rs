//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; dates are `YYYY-MM-DD`; times are
//! `HH:MM:SS`. Embedding vectors are compact JSON arrays. UUIDs are stored
//! as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rollcall_core::{attendance::AttendanceStatus, Embedding};
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
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

// ─── AttendanceStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: AttendanceStatus) -> &'static str {
  match s {
    AttendanceStatus::Present => "PRESENT",
    AttendanceStatus::Completed => "COMPLETED",
  }
}

pub fn decode_status(s: &str) -> Result<AttendanceStatus> {
  match s {
    "PRESENT" => Ok(AttendanceStatus::Present),
    "COMPLETED" => Ok(AttendanceStatus::Completed),
    other => Err(Error::Decode(format!("unknown status: {other:?}"))),
  }
}

// ─── Embedding ───────────────────────────────────────────────────────────────

pub fn encode_embedding(e: &Embedding) -> Result<String> {
  Ok(serde_json::to_string(e.components())?)
}

/// Decoding re-validates the dimension through the `Embedding` constructor,
/// so a corrupted row fails loudly instead of skewing a match.
pub fn decode_embedding(s: &str) -> Result<Embedding> {
  let components: Vec<f32> = serde_json::from_str(s)?;
  Ok(Embedding::new(components)?)
}
