use std::fmt;

use serde::{Deserialize, Serialize};

/// CPU architecture variants an image can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
  #[serde(rename = "x86_64")]
  X86_64,
  #[serde(rename = "aarch64")]
  Aarch64,
  #[serde(rename = "ppc64le")]
  Ppc64le,
  #[serde(rename = "s390x")]
  S390x,
}

impl Arch {
  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
      Self::Ppc64le => "ppc64le",
      Self::S390x => "s390x",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
