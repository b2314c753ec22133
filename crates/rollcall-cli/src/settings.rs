//! Runtime settings — TOML file layered with `ROLLCALL_`-prefixed
//! environment variables.

use std::{path::PathBuf, time::Duration};

use rollcall_capture::DeviceConfig;
use serde::Deserialize;

fn default_threshold() -> f32 { rollcall_core::DEFAULT_THRESHOLD }

fn default_port() -> u16 { 80 }

fn default_device_index() -> usize { 0 }

fn default_connect_timeout() -> u64 { 5 }
fn default_capture_timeout() -> u64 { 10 }
fn default_heartbeat_interval() -> u64 { 10 }
fn default_heartbeat_timeout() -> u64 { 3 }
fn default_extractor_timeout() -> u64 { 10 }

/// Which camera feeds the session.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceSetting {
  #[default]
  Local,
  Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
  pub address: String,
  #[serde(default = "default_port")]
  pub port:    u16,
  #[serde(default = "default_connect_timeout")]
  pub connect_timeout_secs:    u64,
  #[serde(default = "default_capture_timeout")]
  pub capture_timeout_secs:    u64,
  #[serde(default = "default_heartbeat_interval")]
  pub heartbeat_interval_secs: u64,
  #[serde(default = "default_heartbeat_timeout")]
  pub heartbeat_timeout_secs:  u64,
}

impl DeviceSettings {
  pub fn to_config(&self) -> DeviceConfig {
    let mut cfg = DeviceConfig::new(self.address.clone(), self.port);
    cfg.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
    cfg.capture_timeout = Duration::from_secs(self.capture_timeout_secs);
    cfg.heartbeat_interval =
      Duration::from_secs(self.heartbeat_interval_secs);
    cfg.heartbeat_timeout = Duration::from_secs(self.heartbeat_timeout_secs);
    cfg
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraSettings {
  #[serde(default = "default_device_index")]
  pub device_index: usize,
  #[serde(default = "default_capture_timeout")]
  pub capture_timeout_secs: u64,
}

impl Default for CameraSettings {
  fn default() -> Self {
    Self {
      device_index: default_device_index(),
      capture_timeout_secs: default_capture_timeout(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorSettings {
  pub url: String,
  #[serde(default = "default_extractor_timeout")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database path.
  pub store_path: PathBuf,

  /// Maximum Euclidean distance for a positive match.
  #[serde(default = "default_threshold")]
  pub match_threshold: f32,

  #[serde(default)]
  pub source: SourceSetting,

  #[serde(default)]
  pub camera: CameraSettings,

  /// Required when `source = "remote"`.
  pub device: Option<DeviceSettings>,

  pub extractor: ExtractorSettings,
}
