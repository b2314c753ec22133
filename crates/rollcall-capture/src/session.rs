//! The capture session state machine.
//!
//! `Inactive → Active → Processing → {Captured | Error}`, with `Active`
//! reachable again from `Captured`/`Error` via `start()`, and every state
//! returning to `Inactive` on `stop()`. Within one session the pipeline is
//! strictly sequential: one frame, one extraction, one probe embedding.
//! Soft failures (capture timeout, no face) put the session back in
//! `Active`; hard failures park it in `Error` until an explicit
//! stop/restart.

use rollcall_core::Embedding;

use crate::{extract::FaceExtractor, source::FrameSource, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Inactive,
  Active,
  Processing,
  Captured,
  Error,
}

/// One camera acquisition lifecycle, local or remote. Transient and
/// process-local; recreated per attendance attempt.
pub struct CaptureSession<S, E> {
  source:    S,
  extractor: E,
  state:     SessionState,
}

impl<S: FrameSource, E: FaceExtractor> CaptureSession<S, E> {
  pub fn new(source: S, extractor: E) -> Self {
    Self { source, extractor, state: SessionState::Inactive }
  }

  pub fn state(&self) -> SessionState { self.state }

  pub fn source(&self) -> &S { &self.source }

  /// Acquire the camera resource and move to `Active`. Valid from
  /// `Inactive`, and from `Captured`/`Error` as the retry path.
  pub async fn start(&mut self) -> Result<()> {
    if self.state == SessionState::Processing {
      return Err(Error::CaptureInProgress);
    }

    // Release any half-open resource from a previous attempt first.
    self.source.close().await;

    match self.source.open().await {
      Ok(()) => {
        tracing::info!(kind = ?self.source.kind(), "capture session active");
        self.state = SessionState::Active;
        Ok(())
      }
      Err(e) => {
        self.state = SessionState::Error;
        Err(e)
      }
    }
  }

  /// Grab one frame and run extraction, yielding the probe embedding.
  ///
  /// Only valid from `Active`; a call while `Processing` is rejected, not
  /// queued. Soft failures return the session to `Active` so the caller
  /// can retry without reopening the camera.
  pub async fn capture(&mut self) -> Result<Embedding> {
    match self.state {
      SessionState::Active => {}
      SessionState::Processing => return Err(Error::CaptureInProgress),
      // A heartbeat-detected disconnect parks the session here; keep
      // reporting the connection loss until a fresh start().
      SessionState::Error if !self.source.connected() => {
        return Err(Error::DeviceConnection(
          "session lost its device; restart required".to_string(),
        ));
      }
      other => return Err(Error::InvalidState(other)),
    }

    if !self.source.connected() {
      self.state = SessionState::Error;
      return Err(Error::DeviceConnection(
        "device disconnected before capture".to_string(),
      ));
    }

    self.state = SessionState::Processing;

    let frame = match self.source.grab_frame().await {
      Ok(frame) => frame,
      Err(e) if e.is_soft() => {
        self.state = SessionState::Active;
        return Err(e);
      }
      Err(e) => {
        self.state = SessionState::Error;
        return Err(e);
      }
    };

    match self.extractor.extract(&frame).await {
      Ok(Some(embedding)) => {
        tracing::debug!("frame captured and embedded");
        self.state = SessionState::Captured;
        Ok(embedding)
      }
      Ok(None) => {
        self.state = SessionState::Active;
        Err(Error::NoFaceDetected)
      }
      Err(e) => {
        self.state = SessionState::Error;
        Err(e)
      }
    }
  }

  /// Release the camera resource from any state. Idempotent; after this
  /// the session is `Inactive`.
  pub async fn stop(&mut self) {
    self.source.close().await;
    self.state = SessionState::Inactive;
  }
}
