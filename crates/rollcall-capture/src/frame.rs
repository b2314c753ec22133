//! A captured camera frame — an opaque payload handed to the extraction
//! collaborator.

/// Pixel encoding of a frame's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
  /// JPEG-compressed image (remote devices stream MJPEG; local MJPG mode).
  Jpeg,
  /// Raw single-channel bytes, row-major.
  RawGray { width: u32, height: u32 },
}

/// One captured frame.
#[derive(Debug, Clone)]
pub struct Frame {
  pub bytes:  Vec<u8>,
  pub format: FrameFormat,
}

impl Frame {
  pub fn jpeg(bytes: Vec<u8>) -> Self {
    Self { bytes, format: FrameFormat::Jpeg }
  }

  pub fn len(&self) -> usize { self.bytes.len() }

  pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}
