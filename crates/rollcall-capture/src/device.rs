//! HTTP client for the remote camera device wire contract.
//!
//! Request/response endpoints: `GET /status` (connect handshake),
//! `GET /capture` (single frame), `GET /stream` (continuous MJPEG feed),
//! `GET /ping` (heartbeat liveness), `POST /control` (camera settings).
//! Every call is individually bounded; a timeout or non-2xx response fails
//! that call only — only a heartbeat failure tears the connection down.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{frame::Frame, Error, Result};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Address and timeout knobs for one remote device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
  pub address:            String,
  pub port:               u16,
  pub connect_timeout:    Duration,
  pub capture_timeout:    Duration,
  pub heartbeat_interval: Duration,
  pub heartbeat_timeout:  Duration,
}

impl DeviceConfig {
  pub fn new(address: impl Into<String>, port: u16) -> Self {
    Self {
      address:            address.into(),
      port,
      connect_timeout:    Duration::from_secs(5),
      capture_timeout:    Duration::from_secs(10),
      heartbeat_interval: Duration::from_secs(10),
      heartbeat_timeout:  Duration::from_secs(3),
    }
  }
}

// ─── Wire payloads ───────────────────────────────────────────────────────────

/// The JSON descriptor a device returns from `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
  pub model:      String,
  pub firmware:   String,
  pub resolution: String,
}

/// Camera tuning settings for `POST /control`. Absent fields are left
/// unchanged on the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlSettings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub brightness: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub contrast:   Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quality:    Option<i32>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Client for one remote camera device.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based. No
/// client-wide timeout is configured because the stream request must stay
/// open indefinitely; every bounded call wraps itself in
/// [`tokio::time::timeout`] instead.
#[derive(Clone)]
pub struct DeviceClient {
  client: reqwest::Client,
  config: DeviceConfig,
}

impl DeviceClient {
  pub fn new(config: DeviceConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .connect_timeout(config.connect_timeout)
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &DeviceConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("http://{}:{}{}", self.config.address, self.config.port, path)
  }

  async fn bounded<T>(
    &self,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
  ) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
      Ok(result) => result,
      Err(_) => Err(Error::DeviceTimeout(limit)),
    }
  }

  /// `GET /status` — the Connect handshake.
  pub async fn status(&self) -> Result<DeviceDescriptor> {
    let url = self.url("/status");
    self
      .bounded(self.config.connect_timeout, async {
        tracing::debug!(%url, "device status request");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
          return Err(Error::DeviceStatus(resp.status()));
        }
        Ok(resp.json().await?)
      })
      .await
  }

  /// `GET /capture` — one frame, independent of the continuous stream.
  pub async fn capture(&self) -> Result<Frame> {
    let url = self.url("/capture");
    self
      .bounded(self.config.capture_timeout, async {
        tracing::debug!(%url, "device capture request");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
          return Err(Error::DeviceStatus(resp.status()));
        }
        let bytes = resp.bytes().await?;
        Ok(Frame::jpeg(bytes.to_vec()))
      })
      .await
  }

  /// `GET /stream` — open the continuous multipart feed. The returned
  /// response is held for the lifetime of the session; only the opening
  /// handshake is bounded.
  pub async fn open_stream(&self) -> Result<reqwest::Response> {
    let url = self.url("/stream");
    match tokio::time::timeout(
      self.config.connect_timeout,
      self.client.get(&url).send(),
    )
    .await
    {
      Ok(Ok(resp)) if resp.status().is_success() => Ok(resp),
      Ok(Ok(resp)) => {
        Err(Error::Stream(format!("device returned {}", resp.status())))
      }
      Ok(Err(e)) => Err(Error::Stream(e.to_string())),
      Err(_) => Err(Error::Stream(format!(
        "stream open timed out after {:?}",
        self.config.connect_timeout
      ))),
    }
  }

  /// `GET /ping` — heartbeat liveness probe.
  pub async fn ping(&self) -> Result<()> {
    let url = self.url("/ping");
    self
      .bounded(self.config.heartbeat_timeout, async {
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
          return Err(Error::DeviceStatus(resp.status()));
        }
        Ok(())
      })
      .await
  }

  /// `POST /control` — apply camera settings.
  pub async fn apply_settings(&self, settings: &ControlSettings) -> Result<()> {
    let url = self.url("/control");
    self
      .bounded(self.config.connect_timeout, async {
        tracing::debug!(%url, ?settings, "device control request");
        let resp = self.client.post(&url).json(settings).send().await?;
        if !resp.status().is_success() {
          return Err(Error::DeviceStatus(resp.status()));
        }
        Ok(())
      })
      .await
  }
}
