//! [`SqliteStore`] — the SQLite implementation of the store traits.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rollcall_core::{
  attendance::{AttendanceRecord, AttendanceStatus},
  embedding::Embedding,
  store::{
    AttendanceStore, CheckoutOutcome, EnrollmentStore, InsertOutcome,
  },
  subject::{EnrolledSubject, EnrollmentSet, Subject},
};

use crate::{
  encode::{
    decode_date, decode_dt, decode_embedding, decode_status, decode_time,
    decode_uuid, encode_date, encode_dt, encode_embedding, encode_status,
    encode_time, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Constraint classification ───────────────────────────────────────────────

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(e, rusqlite::Error::SqliteFailure(err, _)
    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
      || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
  matches!(e, rusqlite::Error::SqliteFailure(err, _)
    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

// ─── Raw row shapes ──────────────────────────────────────────────────────────

// Plain-string row images; decoded into domain types outside the
// connection closure so decode errors keep their own variants.
type RawSubject = (String, String, String);
type RawRecord = (String, String, String, Option<String>, String);

fn decode_subject((id, name, created): RawSubject) -> Result<Subject> {
  Ok(Subject {
    subject_id:   decode_uuid(&id)?,
    display_name: name,
    created_at:   decode_dt(&created)?,
  })
}

fn decode_record(
  (id, date, check_in, check_out, status): RawRecord,
) -> Result<AttendanceRecord> {
  Ok(AttendanceRecord {
    subject_id:     decode_uuid(&id)?,
    date:           decode_date(&date)?,
    check_in_time:  decode_time(&check_in)?,
    check_out_time: check_out.as_deref().map(decode_time).transpose()?,
    status:         decode_status(&status)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Enrollment and attendance stores backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements run serialized on the connection's worker thread, so each
/// conditional write is atomic with respect to every other caller.
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

// ─── EnrollmentStore ─────────────────────────────────────────────────────────

impl EnrollmentStore for SqliteStore {
  type Error = Error;

  async fn add_subject(&self, display_name: &str) -> Result<Subject> {
    let subject = Subject {
      subject_id:   Uuid::new_v4(),
      display_name: display_name.to_string(),
      created_at:   Utc::now(),
    };

    let id = encode_uuid(subject.subject_id);
    let name = subject.display_name.clone();
    let created = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, display_name, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id, name, created],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    let id = encode_uuid(subject_id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT subject_id, display_name, created_at
             FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(decode_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raw: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, display_name, created_at
           FROM subjects ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(decode_subject).collect()
  }

  async fn insert_embedding(
    &self,
    subject_id: Uuid,
    embedding: Embedding,
  ) -> Result<()> {
    let embedding_id = encode_uuid(Uuid::new_v4());
    let id = encode_uuid(subject_id);
    let vector = encode_embedding(&embedding)?;
    let created = encode_dt(Utc::now());

    let inserted: bool = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO embeddings (embedding_id, subject_id, vector_json, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![embedding_id, id, vector, created],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_foreign_key_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::SubjectNotFound(subject_id));
    }
    Ok(())
  }

  async fn fetch_enrollment(&self) -> Result<EnrollmentSet> {
    // Both queries run inside one closure on the single connection, so
    // the snapshot is consistent for this matching call.
    let (subjects, vectors): (Vec<(String, String)>, Vec<(String, String)>) =
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT subject_id, display_name FROM subjects ORDER BY subject_id",
          )?;
          let subjects = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut stmt = conn.prepare(
            "SELECT subject_id, vector_json FROM embeddings ORDER BY created_at",
          )?;
          let vectors = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          Ok((subjects, vectors))
        })
        .await?;

    let mut set = EnrollmentSet::default();
    for (id, name) in subjects {
      set.subjects.push(EnrolledSubject {
        subject_id:   decode_uuid(&id)?,
        display_name: name,
        embeddings:   Vec::new(),
      });
    }
    for (id, vector) in vectors {
      let subject_id = decode_uuid(&id)?;
      let embedding = decode_embedding(&vector)?;
      if let Some(s) =
        set.subjects.iter_mut().find(|s| s.subject_id == subject_id)
      {
        s.embeddings.push(embedding);
      }
    }
    Ok(set)
  }
}

// ─── AttendanceStore ─────────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  async fn insert_if_absent(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
    check_in_time: NaiveTime,
  ) -> Result<InsertOutcome> {
    let id = encode_uuid(subject_id);
    let day = encode_date(date);
    let time = encode_time(check_in_time);
    let status = encode_status(AttendanceStatus::Present);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO attendance (subject_id, date, check_in_time, status)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id, day, time, status],
        ) {
          Ok(_) => Ok(true),
          // The UNIQUE (subject_id, date) key fired: a record already
          // exists and must not be touched.
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if inserted {
      Ok(InsertOutcome::Inserted(AttendanceRecord {
        subject_id,
        date,
        check_in_time,
        check_out_time: None,
        status: AttendanceStatus::Present,
      }))
    } else {
      Ok(InsertOutcome::DuplicateDay)
    }
  }

  async fn complete_if_open(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
    check_out_time: NaiveTime,
  ) -> Result<CheckoutOutcome> {
    let id = encode_uuid(subject_id);
    let day = encode_date(date);
    let time = encode_time(check_out_time);
    let status = encode_status(AttendanceStatus::Completed);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE attendance
           SET check_out_time = ?3, status = ?4
           WHERE subject_id = ?1 AND date = ?2 AND check_out_time IS NULL",
          rusqlite::params![id, day, time, status],
        )?;

        if changed == 0 {
          return Ok(None);
        }

        let row = conn.query_row(
          "SELECT subject_id, date, check_in_time, check_out_time, status
           FROM attendance WHERE subject_id = ?1 AND date = ?2",
          rusqlite::params![id, day],
          |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
          },
        )?;
        Ok(Some(row))
      })
      .await?;

    match raw {
      Some(raw) => Ok(CheckoutOutcome::Completed(decode_record(raw)?)),
      None => Ok(CheckoutOutcome::NoOpenRecord),
    }
  }

  async fn day_record(
    &self,
    subject_id: Uuid,
    date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let id = encode_uuid(subject_id);
    let day = encode_date(date);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT subject_id, date, check_in_time, check_out_time, status
             FROM attendance WHERE subject_id = ?1 AND date = ?2",
            rusqlite::params![id, day],
            |r| {
              Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(decode_record).transpose()
  }

  async fn records_for_date(
    &self,
    date: NaiveDate,
  ) -> Result<Vec<AttendanceRecord>> {
    let day = encode_date(date);

    let raw: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, date, check_in_time, check_out_time, status
           FROM attendance WHERE date = ?1 ORDER BY check_in_time",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![day], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(decode_record).collect()
  }
}
