//! rollcall binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `ROLLCALL_`-prefixed environment variables, then runs one attendance
//! workflow: enrollment, an attendance attempt, reporting, device
//! discovery, or device control.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rollcall_capture::ControlSettings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;
mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(author, version, about = "Biometric attendance engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Capture a face and add its embedding to a subject's enrollment.
  Enroll {
    /// Display name for a new subject.
    #[arg(long)]
    name:    Option<String>,
    /// Existing subject to add another embedding to.
    #[arg(long)]
    subject: Option<Uuid>,
    /// Extra capture attempts after a soft failure.
    #[arg(long, default_value_t = 3)]
    retries: u32,
  },

  /// Run one attendance attempt: capture, match, check in or out.
  Attend {
    /// Extra capture attempts after a soft failure.
    #[arg(long, default_value_t = 3)]
    retries: u32,
  },

  /// List attendance records for a date (today by default).
  Day {
    /// Date as YYYY-MM-DD.
    #[arg(long)]
    date: Option<NaiveDate>,
  },

  /// List enrolled subjects.
  Subjects,

  /// Scan a /24 subnet for camera devices.
  Scan {
    /// Subnet prefix, e.g. "192.168.1".
    #[arg(long)]
    subnet: String,
    #[arg(long, default_value_t = 80)]
    port:   u16,
  },

  /// Push sensor settings to the configured remote device.
  Control {
    #[arg(long)]
    brightness: Option<i32>,
    #[arg(long)]
    contrast:   Option<i32>,
    #[arg(long)]
    quality:    Option<i32>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Scan needs no configuration at all; handle it before loading any.
  if let Command::Scan { subnet, port } = &cli.command {
    return commands::scan(subnet, *port).await;
  }

  let settings = load_settings(&cli.config)?;

  match cli.command {
    Command::Enroll { name, subject, retries } => {
      commands::enroll(&settings, name, subject, retries).await
    }
    Command::Attend { retries } => commands::attend(&settings, retries).await,
    Command::Day { date } => commands::day(&settings, date).await,
    Command::Subjects => commands::subjects(&settings).await,
    Command::Scan { .. } => unreachable!("handled above"),
    Command::Control { brightness, contrast, quality } => {
      commands::control(
        &settings,
        ControlSettings { brightness, contrast, quality },
      )
      .await
    }
  }
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
  let raw = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("ROLLCALL"))
    .build()
    .context("failed to read config file")?;

  let mut settings: Settings = raw
    .try_deserialize()
    .context("failed to deserialise settings")?;
  settings.store_path = expand_tilde(&settings.store_path);
  Ok(settings)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
