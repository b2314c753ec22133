//! SQLite backend for the Rollcall enrollment and attendance stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The attendance table's
//! `UNIQUE (subject_id, date)` constraint and a guarded single-statement
//! `UPDATE` provide the conditional-write primitives the engine relies on.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
