//! Exported deliverables of a manifest.

use serde::{Deserialize, Serialize};

/// A file produced by an exported pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
  pub pipeline: String,
  pub filename: String,
}

impl Artifact {
  pub fn new(pipeline: &str, filename: &str) -> Self {
    Self {
      pipeline: pipeline.to_string(),
      filename: filename.to_string(),
    }
  }
}
