//! Local V4L2 webcam as a [`FrameSource`].
//!
//! The `v4l` crate is blocking, so device work runs on the blocking pool.
//! The device handle is held open between captures; each `grab_frame`
//! maps a short-lived MJPG stream, discards a warm-up frame, and returns
//! the next one.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use v4l::{
  buffer::Type, io::mmap::Stream as MmapStream, io::traits::CaptureStream,
  video::Capture, Device, FourCC,
};

use crate::{
  frame::Frame,
  source::{FrameSource, SourceKind},
  Error, Result,
};

pub struct LocalCamera {
  device_index:    usize,
  capture_timeout: Duration,
  device:          Option<Arc<Mutex<Device>>>,
}

impl LocalCamera {
  pub fn new(device_index: usize, capture_timeout: Duration) -> Self {
    Self { device_index, capture_timeout, device: None }
  }
}

impl FrameSource for LocalCamera {
  fn kind(&self) -> SourceKind { SourceKind::Local }

  fn connected(&self) -> bool { self.device.is_some() }

  async fn open(&mut self) -> Result<()> {
    let index = self.device_index;
    let device = tokio::task::spawn_blocking(move || -> Result<Device> {
      let device = Device::new(index)
        .map_err(|e| Error::DeviceAccess(format!("/dev/video{index}: {e}")))?;
      let mut format = device
        .format()
        .map_err(|e| Error::DeviceAccess(e.to_string()))?;
      format.fourcc = FourCC::new(b"MJPG");
      device
        .set_format(&format)
        .map_err(|e| Error::DeviceAccess(e.to_string()))?;
      Ok(device)
    })
    .await??;

    tracing::info!(index, "local camera opened");
    self.device = Some(Arc::new(Mutex::new(device)));
    Ok(())
  }

  async fn grab_frame(&mut self) -> Result<Frame> {
    let Some(device) = self.device.clone() else {
      return Err(Error::DeviceAccess("camera is not open".to_string()));
    };

    let limit = self.capture_timeout;
    let grab = tokio::task::spawn_blocking(move || -> Result<Frame> {
      let device = device
        .lock()
        .map_err(|_| Error::DeviceAccess("camera mutex poisoned".into()))?;
      let mut stream =
        MmapStream::with_buffers(&device, Type::VideoCapture, 4)
          .map_err(|e| Error::DeviceAccess(e.to_string()))?;
      // First frame after stream start is often stale or underexposed.
      stream.next().map_err(|e| Error::DeviceAccess(e.to_string()))?;
      let (bytes, _meta) =
        stream.next().map_err(|e| Error::DeviceAccess(e.to_string()))?;
      Ok(Frame::jpeg(bytes.to_vec()))
    });

    match tokio::time::timeout(limit, grab).await {
      Ok(result) => result?,
      Err(_) => Err(Error::DeviceTimeout(limit)),
    }
  }

  async fn close(&mut self) {
    if self.device.take().is_some() {
      tracing::info!(index = self.device_index, "local camera released");
    }
  }
}
