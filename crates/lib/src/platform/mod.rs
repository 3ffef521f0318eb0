//! Target platform descriptor.
//!
//! A [`Platform`] combines the CPU architecture with the boot mechanism of the
//! image. The boot mode decides which mounts the bootloader installation needs.

pub mod arch;

use std::fmt;

use serde::{Deserialize, Serialize};

use arch::Arch;

/// How firmware boots the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootMode {
  /// BIOS only.
  Legacy,
  /// UEFI only.
  #[default]
  Uefi,
  /// Both BIOS and UEFI.
  Hybrid,
}

impl BootMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Legacy => "legacy",
      Self::Uefi => "uefi",
      Self::Hybrid => "hybrid",
    }
  }
}

/// Platform identifier combining architecture and boot mode (e.g., "x86_64-uefi")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub arch: Arch,
  #[serde(default)]
  pub boot_mode: BootMode,
}

impl Platform {
  pub fn new(arch: Arch, boot_mode: BootMode) -> Self {
    Self { arch, boot_mode }
  }

  /// Whether the image needs an EFI system partition mounted at `/boot/efi`.
  pub fn requires_esp(&self) -> bool {
    matches!(self.boot_mode, BootMode::Uefi | BootMode::Hybrid)
  }

  /// Returns the platform string (e.g., "aarch64-uefi")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.boot_mode.as_str())
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
