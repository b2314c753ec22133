//! Core types and trait definitions for the Rollcall attendance engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod attendance;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod store;
pub mod subject;

pub use embedding::{Embedding, EMBEDDING_DIM};
pub use error::{Error, Result};
pub use matcher::{MatchOutcome, SubjectMatch, DEFAULT_THRESHOLD};
