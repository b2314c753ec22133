//! Nearest-neighbor identity matching over the enrollment set.
//!
//! A deliberate linear scan: enrollment sets here are small, and the
//! contract leaves room for an indexed search to replace the scan later
//! without changing the signature.

use uuid::Uuid;

use crate::{
  embedding::{Embedding, EMBEDDING_DIM},
  subject::EnrollmentSet,
  Error, Result,
};

/// Maximum Euclidean distance for a positive identity match.
pub const DEFAULT_THRESHOLD: f32 = 0.6;

/// A positive identification.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectMatch {
  pub subject_id:   Uuid,
  pub display_name: String,
  /// Minimum Euclidean distance over the subject's embeddings.
  pub distance:     f32,
  /// `100·(1 − distance/threshold)`, clamped to `[0, 100]`.
  pub similarity:   f32,
}

/// Result of a matching call. `NoMatch` is a negative answer, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
  Match(SubjectMatch),
  NoMatch,
}

impl MatchOutcome {
  pub fn is_match(&self) -> bool { matches!(self, Self::Match(_)) }
}

/// Find the enrolled subject closest to `probe`, accepting only if its
/// minimum distance is strictly below `threshold`.
///
/// Pure and side-effect free; safe to call concurrently as long as each
/// caller holds its own snapshot of the enrollment set. An empty set is a
/// valid input and always yields `NoMatch`. Ties below the threshold are
/// broken by the smallest subject id so matching stays deterministic.
pub fn find_match(
  probe: &Embedding,
  set: &EnrollmentSet,
  threshold: f32,
) -> Result<MatchOutcome> {
  // The constructor already enforces this; re-check so a malformed probe
  // smuggled in through deserialization still fails loudly.
  if probe.components().len() != EMBEDDING_DIM {
    return Err(Error::Dimension {
      expected: EMBEDDING_DIM,
      got:      probe.components().len(),
    });
  }

  let mut best: Option<(Uuid, &str, f32)> = None;

  for subject in &set.subjects {
    let Some(distance) = subject
      .embeddings
      .iter()
      .map(|e| probe.distance(e))
      .min_by(|a, b| a.total_cmp(b))
    else {
      // Enrolled but without embeddings; nothing to compare against.
      continue;
    };

    let closer = match best {
      None => true,
      Some((best_id, _, best_d)) => {
        distance < best_d
          || (distance == best_d && subject.subject_id < best_id)
      }
    };
    if closer {
      best = Some((subject.subject_id, &subject.display_name, distance));
    }
  }

  match best {
    Some((subject_id, display_name, distance)) if distance < threshold => {
      let similarity =
        (100.0 * (1.0 - distance / threshold)).clamp(0.0, 100.0);
      Ok(MatchOutcome::Match(SubjectMatch {
        subject_id,
        display_name: display_name.to_string(),
        distance,
        similarity,
      }))
    }
    _ => Ok(MatchOutcome::NoMatch),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subject::EnrolledSubject;

  fn vector(fill: f32) -> Embedding {
    Embedding::new(vec![fill; EMBEDDING_DIM]).unwrap()
  }

  /// An embedding at a chosen Euclidean distance from the all-zero vector.
  fn at_distance(d: f32) -> Embedding {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[0] = d;
    Embedding::new(v).unwrap()
  }

  fn enrolled(id: u128, name: &str, embeddings: Vec<Embedding>) -> EnrolledSubject {
    EnrolledSubject {
      subject_id: Uuid::from_u128(id),
      display_name: name.to_string(),
      embeddings,
    }
  }

  #[test]
  fn empty_set_yields_no_match() {
    let outcome =
      find_match(&vector(0.0), &EnrollmentSet::default(), DEFAULT_THRESHOLD)
        .unwrap();
    assert_eq!(outcome, MatchOutcome::NoMatch);
  }

  #[test]
  fn exact_match_has_full_similarity() {
    let probe = vector(0.1);
    let set = EnrollmentSet {
      subjects: vec![enrolled(1, "Ada", vec![probe.clone()])],
    };

    let MatchOutcome::Match(m) =
      find_match(&probe, &set, DEFAULT_THRESHOLD).unwrap()
    else {
      panic!("expected a match");
    };
    assert_eq!(m.subject_id, Uuid::from_u128(1));
    assert_eq!(m.distance, 0.0);
    assert_eq!(m.similarity, 100.0);
  }

  #[test]
  fn all_beyond_threshold_is_no_match() {
    let set = EnrollmentSet {
      subjects: vec![
        enrolled(1, "Ada", vec![at_distance(0.6)]),
        enrolled(2, "Grace", vec![at_distance(2.0)]),
      ],
    };

    let outcome =
      find_match(&vector(0.0), &set, DEFAULT_THRESHOLD).unwrap();
    assert_eq!(outcome, MatchOutcome::NoMatch);
  }

  #[test]
  fn similarity_formula_concrete_scenario() {
    // Probe at distance 0.15 from subject A, everyone else ≥ τ.
    let set = EnrollmentSet {
      subjects: vec![
        enrolled(1, "A", vec![at_distance(0.15)]),
        enrolled(2, "B", vec![at_distance(0.9)]),
      ],
    };

    let MatchOutcome::Match(m) =
      find_match(&vector(0.0), &set, 0.6).unwrap()
    else {
      panic!("expected a match");
    };
    assert_eq!(m.subject_id, Uuid::from_u128(1));
    assert!((m.distance - 0.15).abs() < 1e-6);
    assert!((m.similarity - 75.0).abs() < 1e-4);
  }

  #[test]
  fn minimum_distance_over_multiple_embeddings() {
    let set = EnrollmentSet {
      subjects: vec![enrolled(
        1,
        "Ada",
        vec![at_distance(0.5), at_distance(0.1), at_distance(0.4)],
      )],
    };

    let MatchOutcome::Match(m) =
      find_match(&vector(0.0), &set, DEFAULT_THRESHOLD).unwrap()
    else {
      panic!("expected a match");
    };
    assert!((m.distance - 0.1).abs() < 1e-6);
  }

  #[test]
  fn tie_breaks_on_smallest_subject_id() {
    // Both subjects at the same distance; order in the set reversed from
    // id order to make the tie-break observable.
    let set = EnrollmentSet {
      subjects: vec![
        enrolled(9, "Later", vec![at_distance(0.2)]),
        enrolled(3, "Earlier", vec![at_distance(0.2)]),
      ],
    };

    let MatchOutcome::Match(m) =
      find_match(&vector(0.0), &set, DEFAULT_THRESHOLD).unwrap()
    else {
      panic!("expected a match");
    };
    assert_eq!(m.subject_id, Uuid::from_u128(3));
  }

  #[test]
  fn subject_without_embeddings_is_skipped() {
    let set = EnrollmentSet {
      subjects: vec![
        enrolled(1, "Empty", vec![]),
        enrolled(2, "Ada", vec![at_distance(0.3)]),
      ],
    };

    let MatchOutcome::Match(m) =
      find_match(&vector(0.0), &set, DEFAULT_THRESHOLD).unwrap()
    else {
      panic!("expected a match");
    };
    assert_eq!(m.subject_id, Uuid::from_u128(2));
  }
}
