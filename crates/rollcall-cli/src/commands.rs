//! Subcommand implementations — thin orchestration over the library
//! crates. The attend pipeline is the one strictly-ordered task: capture →
//! extraction → match → attendance transition.

use std::time::Duration;

use anyhow::{anyhow, bail, Context as _};
use chrono::{Local, NaiveDate};
use rollcall_capture::{
  discovery, CaptureSession, ControlSettings, DeviceClient, FaceExtractor,
  Frame, FrameSource, HttpExtractor, RemoteCamera, SourceKind,
};
use rollcall_capture::local::LocalCamera;
use rollcall_core::{
  engine::{mark_attendance, AttendanceOutcome},
  matcher::{find_match, MatchOutcome},
  store::{AttendanceStore, EnrollmentStore},
  Embedding,
};
use rollcall_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::settings::{Settings, SourceSetting};

// ─── Source selection ────────────────────────────────────────────────────────

/// Runtime-selected camera, local or remote, behind one `FrameSource`.
pub enum AnySource {
  Local(LocalCamera),
  Remote(RemoteCamera),
}

impl FrameSource for AnySource {
  fn kind(&self) -> SourceKind {
    match self {
      Self::Local(s) => s.kind(),
      Self::Remote(s) => s.kind(),
    }
  }

  fn connected(&self) -> bool {
    match self {
      Self::Local(s) => s.connected(),
      Self::Remote(s) => s.connected(),
    }
  }

  async fn open(&mut self) -> rollcall_capture::Result<()> {
    match self {
      Self::Local(s) => s.open().await,
      Self::Remote(s) => s.open().await,
    }
  }

  async fn grab_frame(&mut self) -> rollcall_capture::Result<Frame> {
    match self {
      Self::Local(s) => s.grab_frame().await,
      Self::Remote(s) => s.grab_frame().await,
    }
  }

  async fn close(&mut self) {
    match self {
      Self::Local(s) => s.close().await,
      Self::Remote(s) => s.close().await,
    }
  }
}

fn build_source(settings: &Settings) -> anyhow::Result<AnySource> {
  match settings.source {
    SourceSetting::Local => Ok(AnySource::Local(LocalCamera::new(
      settings.camera.device_index,
      Duration::from_secs(settings.camera.capture_timeout_secs),
    ))),
    SourceSetting::Remote => {
      let device = settings
        .device
        .as_ref()
        .context("source = \"remote\" requires a [device] section")?;
      Ok(AnySource::Remote(RemoteCamera::new(device.to_config())?))
    }
  }
}

fn build_extractor(settings: &Settings) -> anyhow::Result<HttpExtractor> {
  Ok(HttpExtractor::new(
    settings.extractor.url.clone(),
    Duration::from_secs(settings.extractor.timeout_secs),
  )?)
}

/// Drive the session until it yields a probe embedding, retrying soft
/// failures up to `retries` extra times.
async fn capture_probe<S: FrameSource, E: FaceExtractor>(
  session: &mut CaptureSession<S, E>,
  retries: u32,
) -> anyhow::Result<Embedding> {
  let mut remaining = retries + 1;
  loop {
    match session.capture().await {
      Ok(probe) => return Ok(probe),
      Err(e) if e.is_soft() && remaining > 1 => {
        remaining -= 1;
        tracing::warn!(error = %e, remaining, "capture attempt failed, retrying");
      }
      Err(e) => return Err(e.into()),
    }
  }
}

// ─── Subcommands ─────────────────────────────────────────────────────────────

pub async fn enroll(
  settings: &Settings,
  name: Option<String>,
  subject_id: Option<Uuid>,
  retries: u32,
) -> anyhow::Result<()> {
  let store = SqliteStore::open(&settings.store_path)
    .await
    .context("failed to open store")?;

  let subject = match (name, subject_id) {
    (Some(name), None) => store.add_subject(&name).await?,
    (None, Some(id)) => store
      .get_subject(id)
      .await?
      .ok_or_else(|| anyhow!("no subject with id {id}"))?,
    _ => bail!("pass exactly one of --name (new) or --subject (re-enroll)"),
  };

  let mut session =
    CaptureSession::new(build_source(settings)?, build_extractor(settings)?);
  session.start().await.context("failed to start camera")?;
  let result = capture_probe(&mut session, retries).await;
  session.stop().await;

  let probe = result?;
  store.insert_embedding(subject.subject_id, probe).await?;
  println!(
    "Enrolled embedding for {} ({})",
    subject.display_name, subject.subject_id
  );
  Ok(())
}

pub async fn attend(settings: &Settings, retries: u32) -> anyhow::Result<()> {
  let store = SqliteStore::open(&settings.store_path)
    .await
    .context("failed to open store")?;

  let mut session =
    CaptureSession::new(build_source(settings)?, build_extractor(settings)?);
  session.start().await.context("failed to start camera")?;
  let result = run_attempt(&store, &mut session, settings, retries).await;
  session.stop().await;
  result
}

async fn run_attempt<S: FrameSource, E: FaceExtractor>(
  store: &SqliteStore,
  session: &mut CaptureSession<S, E>,
  settings: &Settings,
  retries: u32,
) -> anyhow::Result<()> {
  let mut remaining = retries + 1;
  let matched = loop {
    let probe = capture_probe(session, retries).await?;

    // Snapshot per matching call; enrollment may grow between attempts.
    let enrollment = store.fetch_enrollment().await?;
    match find_match(&probe, &enrollment, settings.match_threshold)? {
      MatchOutcome::Match(m) => break m,
      MatchOutcome::NoMatch if remaining > 1 => {
        remaining -= 1;
        tracing::warn!(remaining, "face not recognized, retrying");
        session.start().await.context("failed to rearm camera")?;
      }
      MatchOutcome::NoMatch => {
        bail!("face not recognized; is the subject enrolled?");
      }
    }
  };

  tracing::info!(
    subject = %matched.subject_id,
    similarity = matched.similarity,
    "subject identified"
  );

  let now = Local::now().naive_local();
  let outcome =
    mark_attendance(store, matched.subject_id, now.date(), now.time(), None)
      .await?;

  let record = outcome.record();
  match &outcome {
    AttendanceOutcome::CheckedIn(_) => println!(
      "Welcome, {}! Checked in at {} (similarity {:.1}%).",
      matched.display_name,
      record.check_in_time.format("%H:%M:%S"),
      matched.similarity
    ),
    AttendanceOutcome::CheckedOut(_) => println!(
      "Goodbye, {}! Checked out at {} (similarity {:.1}%).",
      matched.display_name,
      record
        .check_out_time
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default(),
      matched.similarity
    ),
  }
  Ok(())
}

pub async fn day(
  settings: &Settings,
  date: Option<NaiveDate>,
) -> anyhow::Result<()> {
  let store = SqliteStore::open(&settings.store_path).await?;
  let date = date.unwrap_or_else(|| Local::now().date_naive());

  let records = store.records_for_date(date).await?;
  if records.is_empty() {
    println!("No attendance records for {date}.");
    return Ok(());
  }

  println!("Attendance for {date}:");
  for record in records {
    let name = store
      .get_subject(record.subject_id)
      .await?
      .map(|s| s.display_name)
      .unwrap_or_else(|| record.subject_id.to_string());
    let check_out = record
      .check_out_time
      .map(|t| t.format("%H:%M:%S").to_string())
      .unwrap_or_else(|| "—".to_string());
    println!(
      "  {:<24} in {}  out {}  {:?}",
      name,
      record.check_in_time.format("%H:%M:%S"),
      check_out,
      record.status
    );
  }
  Ok(())
}

pub async fn subjects(settings: &Settings) -> anyhow::Result<()> {
  let store = SqliteStore::open(&settings.store_path).await?;
  let subjects = store.list_subjects().await?;
  if subjects.is_empty() {
    println!("No subjects enrolled.");
    return Ok(());
  }
  for subject in subjects {
    println!("{}  {}", subject.subject_id, subject.display_name);
  }
  Ok(())
}

pub async fn scan(subnet: &str, port: u16) -> anyhow::Result<()> {
  println!("Scanning {subnet}.1-254 on port {port}…");
  let found =
    discovery::scan_subnet(subnet, port, Duration::from_millis(800)).await?;
  if found.is_empty() {
    println!("No devices found.");
  } else {
    for addr in found {
      println!("Device at {addr}:{port}");
    }
  }
  Ok(())
}

pub async fn control(
  settings: &Settings,
  control: ControlSettings,
) -> anyhow::Result<()> {
  let device = settings
    .device
    .as_ref()
    .context("control requires a [device] section in the config")?;
  let client = DeviceClient::new(device.to_config())?;
  client
    .apply_settings(&control)
    .await
    .context("failed to apply device settings")?;
  println!("Settings applied.");
  Ok(())
}
