//! The `FrameSource` seam between the session state machine and camera
//! hardware, local or remote.

use std::future::Future;

use crate::{frame::Frame, Result};

/// Where a session's frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  Local,
  Remote,
}

/// A camera a capture session can draw frames from.
///
/// `open` acquires the underlying resource (local device handle, or the
/// remote connect handshake plus stream and heartbeat); `close` must
/// release it on every exit path and is required to be idempotent.
pub trait FrameSource: Send {
  fn kind(&self) -> SourceKind;

  /// Whether the source currently holds a live resource. For remote
  /// sources this reflects the heartbeat's view of the device.
  fn connected(&self) -> bool;

  fn open(&mut self) -> impl Future<Output = Result<()>> + Send + '_;

  /// Acquire a single frame, bounded by the source's capture timeout.
  fn grab_frame(&mut self) -> impl Future<Output = Result<Frame>> + Send + '_;

  fn close(&mut self) -> impl Future<Output = ()> + Send + '_;
}
