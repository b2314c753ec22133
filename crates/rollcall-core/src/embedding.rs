//! Face embedding — a fixed-dimension vector used for identity comparison.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Dimension produced by the extraction collaborator's recognition model.
pub const EMBEDDING_DIM: usize = 128;

/// A 128-component face embedding. Immutable once created.
///
/// The only way to construct one is through [`Embedding::new`], which
/// enforces the dimension, so a value of this type is always well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding(Vec<f32>);

impl Embedding {
  pub fn new(components: Vec<f32>) -> Result<Self> {
    if components.len() != EMBEDDING_DIM {
      return Err(Error::Dimension {
        expected: EMBEDDING_DIM,
        got:      components.len(),
      });
    }
    Ok(Self(components))
  }

  pub fn components(&self) -> &[f32] { &self.0 }

  /// Euclidean distance to another embedding.
  pub fn distance(&self, other: &Embedding) -> f32 {
    self
      .0
      .iter()
      .zip(&other.0)
      .map(|(a, b)| (a - b) * (a - b))
      .sum::<f32>()
      .sqrt()
  }
}

impl TryFrom<Vec<f32>> for Embedding {
  type Error = Error;

  fn try_from(v: Vec<f32>) -> Result<Self> { Self::new(v) }
}

impl From<Embedding> for Vec<f32> {
  fn from(e: Embedding) -> Self { e.0 }
}
