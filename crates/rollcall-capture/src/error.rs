//! Error type for `rollcall-capture`, and the soft/hard split that drives
//! session propagation: soft failures return the session to `Active` for a
//! retry; hard failures park it in `Error` until an explicit stop/restart.

use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum Error {
  #[error("camera access failed: {0}")]
  DeviceAccess(String),

  #[error("remote device connection lost: {0}")]
  DeviceConnection(String),

  /// A single bounded device call timed out. The underlying connection is
  /// still considered healthy; only this attempt failed.
  #[error("device call timed out after {0:?}")]
  DeviceTimeout(Duration),

  #[error("failed to open device stream: {0}")]
  Stream(String),

  #[error("device returned status {0}")]
  DeviceStatus(reqwest::StatusCode),

  #[error("a capture is already in flight for this session")]
  CaptureInProgress,

  #[error("operation not valid in session state {0:?}")]
  InvalidState(SessionState),

  /// The extractor saw the frame but found no face in it. A normal retry
  /// path, not a fault.
  #[error("no face found in the captured frame")]
  NoFaceDetected,

  #[error("extraction service failure: {0}")]
  ExtractionService(String),

  #[error("invalid subnet prefix: {0}")]
  Subnet(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("core error: {0}")]
  Core(#[from] rollcall_core::Error),

  #[error("task join error: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Soft failures leave the session usable; the caller simply retries.
  pub fn is_soft(&self) -> bool {
    matches!(self, Self::DeviceTimeout(_) | Self::NoFaceDetected)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
