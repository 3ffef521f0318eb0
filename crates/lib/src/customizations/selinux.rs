use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ManifestError;

/// SELinux state written to `/etc/selinux/config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelinuxState {
  #[default]
  Enforcing,
  Permissive,
  Disabled,
}

impl FromStr for SelinuxState {
  type Err = ManifestError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "enforcing" => Ok(Self::Enforcing),
      "permissive" => Ok(Self::Permissive),
      "disabled" => Ok(Self::Disabled),
      other => Err(ManifestError::UnknownSelinuxMode(other.to_string())),
    }
  }
}

impl SelinuxState {
  /// Parse a mode string, falling back to `enforcing` for unknown values.
  pub fn from_mode(mode: &str) -> Self {
    mode.parse().unwrap_or_else(|err: ManifestError| {
      warn!(mode = %mode, error = %err, "falling back to enforcing SELinux state");
      Self::Enforcing
    })
  }
}
