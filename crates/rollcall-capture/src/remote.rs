//! Remote network camera as a [`FrameSource`].
//!
//! `open()` runs the Connect handshake (`GET /status`), opens the
//! continuous stream feed, and spawns the heartbeat task. The heartbeat
//! pings on a fixed interval; its first failure or timeout flips the
//! shared connected flag and the task exits — no automatic retry, the
//! caller must reconnect with a fresh `open()`.

use tokio::{sync::watch, task::JoinHandle};

use crate::{
  device::{DeviceClient, DeviceConfig, DeviceDescriptor},
  frame::Frame,
  source::{FrameSource, SourceKind},
  Error, Result,
};

pub struct RemoteCamera {
  client:     DeviceClient,
  descriptor: Option<DeviceDescriptor>,
  stream:     Option<reqwest::Response>,
  connected:  Option<watch::Receiver<bool>>,
  heartbeat:  Option<JoinHandle<()>>,
}

impl RemoteCamera {
  pub fn new(config: DeviceConfig) -> Result<Self> {
    Ok(Self {
      client:     DeviceClient::new(config)?,
      descriptor: None,
      stream:     None,
      connected:  None,
      heartbeat:  None,
    })
  }

  /// The descriptor received during the last successful handshake.
  pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
    self.descriptor.as_ref()
  }

  pub fn client(&self) -> &DeviceClient { &self.client }

  fn spawn_heartbeat(&mut self) {
    let (tx, rx) = watch::channel(true);
    let client = self.client.clone();
    let interval = client.config().heartbeat_interval;

    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
      // The first tick fires immediately; skip it, the handshake just
      // proved the device alive.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        if let Err(e) = client.ping().await {
          tracing::warn!(error = %e, "device heartbeat failed, marking disconnected");
          let _ = tx.send(false);
          break;
        }
        tracing::trace!("device heartbeat ok");
      }
    });

    self.connected = Some(rx);
    self.heartbeat = Some(handle);
  }

  fn teardown(&mut self) {
    if let Some(handle) = self.heartbeat.take() {
      handle.abort();
    }
    self.stream = None;
    self.connected = None;
    self.descriptor = None;
  }
}

impl FrameSource for RemoteCamera {
  fn kind(&self) -> SourceKind { SourceKind::Remote }

  fn connected(&self) -> bool {
    self.connected.as_ref().is_some_and(|rx| *rx.borrow())
  }

  async fn open(&mut self) -> Result<()> {
    self.teardown();

    let descriptor = self.client.status().await.map_err(|e| {
      Error::DeviceConnection(format!("connect handshake failed: {e}"))
    })?;
    tracing::info!(
      model = %descriptor.model,
      firmware = %descriptor.firmware,
      "remote camera connected"
    );

    // The continuous feed stays open for the session; captures go through
    // their own bounded requests.
    let stream = self.client.open_stream().await?;

    self.descriptor = Some(descriptor);
    self.stream = Some(stream);
    self.spawn_heartbeat();
    Ok(())
  }

  async fn grab_frame(&mut self) -> Result<Frame> {
    if !self.connected() {
      return Err(Error::DeviceConnection(
        "device heartbeat lost; reconnect required".to_string(),
      ));
    }
    self.client.capture().await
  }

  async fn close(&mut self) {
    if self.heartbeat.is_some() {
      tracing::info!("remote camera session closed");
    }
    self.teardown();
  }
}
