use serde::{Deserialize, Serialize};

/// Configuration of an OpenSCAP remediation run against the deployed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationConfig {
  /// Path of the SCAP datastream inside the image.
  pub datastream: String,
  pub profile_id: String,
  /// Optional tailoring file adjusting the profile.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tailoring: Option<String>,
  #[serde(default)]
  pub compress_results: bool,
}
