use std::collections::BTreeMap;

use serde::Serialize;

use super::stage::{Stage, StageOptions};
use crate::consts::SELINUX_EXCLUDED_ROOT;
use crate::customizations::selinux::SelinuxState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelinuxStageOptions {
  pub file_contexts: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub exclude_paths: Vec<String>,
  /// Explicit labels overriding the file contexts, keyed by path.
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub labels: BTreeMap<String, String>,
}

impl SelinuxStageOptions {
  /// Label against the file contexts of `policy`, relative to the tree.
  pub fn for_policy(policy: &str) -> Self {
    Self {
      file_contexts: format!("etc/selinux/{policy}/contexts/files/file_contexts"),
      exclude_paths: Vec::new(),
      labels: BTreeMap::new(),
    }
  }

  /// Leave the ostree physical root alone when labeling a deployment.
  pub fn excluding_sysroot(mut self) -> Self {
    self.exclude_paths.push(SELINUX_EXCLUDED_ROOT.to_string());
    self
  }

  pub fn with_label(mut self, path: &str, label: &str) -> Self {
    self.labels.insert(path.to_string(), label.to_string());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelinuxConfigStageOptions {
  pub state: SelinuxState,
}

pub fn new_selinux_stage(options: SelinuxStageOptions) -> Stage {
  Stage::new("org.osbuild.selinux", Some(StageOptions::Selinux(options)))
}

pub fn new_selinux_config_stage(state: SelinuxState) -> Stage {
  Stage::new(
    "org.osbuild.selinux.config",
    Some(StageOptions::SelinuxConfig(SelinuxConfigStageOptions { state })),
  )
}
