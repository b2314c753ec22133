//! The face-extraction collaborator seam.
//!
//! Extraction itself (detection + the recognition model) is external to
//! this engine; the session only needs the contract: a frame goes in, and
//! either a 128-dimension probe vector comes back, or `None` when the
//! frame contains no usable face. `None` is a normal retry path; a
//! transport or model failure is a hard error.

use std::{future::Future, time::Duration};

use rollcall_core::Embedding;
use serde::Deserialize;

use crate::{frame::Frame, Error, Result};

pub trait FaceExtractor: Send + Sync {
  /// Extract a probe embedding from `frame`. `Ok(None)` means no face was
  /// detected — soft, retryable. `Err` means the extraction backend
  /// itself failed.
  fn extract<'a>(
    &'a self,
    frame: &'a Frame,
  ) -> impl Future<Output = Result<Option<Embedding>>> + Send + 'a;
}

// ─── HTTP-backed implementation ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExtractResponse {
  embedding: Option<Vec<f32>>,
}

/// Extractor backed by an out-of-process embedding service.
///
/// Cheap to clone. POSTs the raw frame and expects
/// `{"embedding": [f32; 128] | null}` back.
#[derive(Clone)]
pub struct HttpExtractor {
  client:   reqwest::Client,
  endpoint: String,
  timeout:  Duration,
}

impl HttpExtractor {
  pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self { client, endpoint: endpoint.into(), timeout })
  }
}

impl FaceExtractor for HttpExtractor {
  async fn extract(&self, frame: &Frame) -> Result<Option<Embedding>> {
    let request = self
      .client
      .post(&self.endpoint)
      .header("content-type", "application/octet-stream")
      .body(frame.bytes.clone())
      .send();

    let resp = match tokio::time::timeout(self.timeout, request).await {
      Ok(Ok(resp)) => resp,
      Ok(Err(e)) => return Err(Error::ExtractionService(e.to_string())),
      Err(_) => {
        return Err(Error::ExtractionService(format!(
          "extraction timed out after {:?}",
          self.timeout
        )));
      }
    };
    if !resp.status().is_success() {
      return Err(Error::ExtractionService(format!(
        "extraction service returned {}",
        resp.status()
      )));
    }

    let body: ExtractResponse = resp
      .json()
      .await
      .map_err(|e| Error::ExtractionService(e.to_string()))?;

    match body.embedding {
      None => Ok(None),
      // A service emitting the wrong dimension is a backend fault, not a
      // bad frame.
      Some(components) => match Embedding::new(components) {
        Ok(embedding) => Ok(Some(embedding)),
        Err(e) => Err(Error::ExtractionService(e.to_string())),
      },
    }
  }
}
