use serde::Serialize;

use super::stage::{Stage, StageOptions};
use crate::customizations::oscap::RemediationConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OscapRemediationStageOptions {
  /// Directory receiving the remediation results.
  pub data_dir: String,
  pub config: OscapConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OscapConfig {
  pub profile_id: String,
  pub datastream: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tailoring: Option<String>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub compress_results: bool,
}

impl OscapRemediationStageOptions {
  pub fn new(data_dir: &str, config: &RemediationConfig) -> Self {
    Self {
      data_dir: data_dir.to_string(),
      config: OscapConfig {
        profile_id: config.profile_id.clone(),
        datastream: config.datastream.clone(),
        tailoring: config.tailoring.clone(),
        compress_results: config.compress_results,
      },
    }
  }
}

pub fn new_oscap_remediation_stage(options: OscapRemediationStageOptions) -> Stage {
  Stage::new(
    "org.osbuild.oscap.remediation",
    Some(StageOptions::OscapRemediation(options)),
  )
}
