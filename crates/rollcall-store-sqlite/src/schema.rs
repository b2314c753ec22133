//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id   TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL    -- ISO 8601 UTC
);

-- Embeddings are append-only; a subject may have several (re-enrollment).
-- No UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS embeddings (
    embedding_id TEXT PRIMARY KEY,
    subject_id   TEXT NOT NULL REFERENCES subjects(subject_id),
    vector_json  TEXT NOT NULL,   -- JSON array of 128 floats
    created_at   TEXT NOT NULL
);

-- One row per subject per calendar date. The UNIQUE key is what makes a
-- concurrent duplicate check-in lose instead of overwriting.
CREATE TABLE IF NOT EXISTS attendance (
    subject_id     TEXT NOT NULL REFERENCES subjects(subject_id),
    date           TEXT NOT NULL,   -- YYYY-MM-DD
    check_in_time  TEXT NOT NULL,   -- HH:MM:SS
    check_out_time TEXT,            -- HH:MM:SS, set once by check-out
    status         TEXT NOT NULL,   -- 'PRESENT' | 'COMPLETED'
    UNIQUE (subject_id, date)
);

CREATE INDEX IF NOT EXISTS embeddings_subject_idx ON embeddings(subject_id);
CREATE INDEX IF NOT EXISTS attendance_date_idx    ON attendance(date);

PRAGMA user_version = 1;
";
