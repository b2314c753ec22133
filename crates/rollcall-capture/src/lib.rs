//! Capture session management for the Rollcall attendance engine.
//!
//! A capture session owns one camera acquisition lifecycle — a local V4L2
//! device or a remote network camera speaking the HTTP wire contract
//! (`/status`, `/stream`, `/capture`, `/ping`, `POST /control`) — and
//! drives frame acquisition through the external face-extraction
//! collaborator to produce a probe embedding. Remote liveness is watched
//! by a periodic heartbeat task owned by the session's source.

pub mod device;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod frame;
pub mod local;
pub mod remote;
pub mod session;
pub mod source;

pub use device::{ControlSettings, DeviceClient, DeviceConfig, DeviceDescriptor};
pub use error::{Error, Result};
pub use extract::{FaceExtractor, HttpExtractor};
pub use frame::{Frame, FrameFormat};
pub use remote::RemoteCamera;
pub use session::{CaptureSession, SessionState};
pub use source::{FrameSource, SourceKind};

#[cfg(test)]
pub(crate) mod testutil;
