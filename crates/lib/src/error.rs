//! Error types for manifest compilation.
//!
//! Every failure is classified by [`ErrorKind`]:
//!
//! - [`ErrorKind::ContractViolation`]: the caller broke an invariant of the
//!   compiler (missing partition table, double binding, wrong input count...).
//!   These abort the compilation of the whole manifest.
//! - [`ErrorKind::Configuration`]: a configuration value was not recognized but
//!   a documented default exists. Callers decide whether to degrade or fail.

use thiserror::Error;

use crate::customizations::fsnode::NodeError;

/// Classification of a [`ManifestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Unrecoverable caller-side invariant breach.
  ContractViolation,
  /// Unrecognized configuration value with a safe default.
  Configuration,
}

/// Errors that can occur while compiling a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// The image pipeline was generated without a partition table.
  #[error("missing partition table for pipeline '{pipeline}'")]
  MissingPartitionTable { pipeline: String },

  /// Inputs were bound while a binding window was still open.
  #[error("binding already active for pipeline '{pipeline}'")]
  BindingAlreadyActive { pipeline: String },

  /// Inputs were taken or unbound outside a binding window.
  #[error("no active binding for pipeline '{pipeline}'")]
  NoActiveBinding { pipeline: String },

  /// Stages were generated twice within one binding window.
  #[error("bound inputs for pipeline '{pipeline}' were already consumed in this binding window")]
  InputsAlreadyConsumed { pipeline: String },

  /// The pipeline got zero or several container inputs.
  #[error("pipeline '{pipeline}' expects exactly one container input, got {count}")]
  InputCardinality { pipeline: String, count: usize },

  /// The partition table mounts nothing at `/`.
  #[error("no root filesystem ('/') in partition table")]
  NoRootFilesystem,

  /// A mounted filesystem has no mount driver.
  #[error("unsupported filesystem type '{fs_type}' for mountpoint '{mountpoint}'")]
  UnsupportedFilesystem { fs_type: String, mountpoint: String },

  /// Mounts the bootloader installation needs are absent.
  #[error("required mounts for bootupd stage missing: {missing:?}")]
  MissingBootMounts { missing: Vec<String> },

  /// Two pipelines were registered under the same name.
  #[error("duplicate pipeline name '{0}'")]
  DuplicatePipeline(String),

  /// A pipeline names a build pipeline that was never registered.
  #[error("pipeline '{pipeline}' references unknown build pipeline '{build}'")]
  UnknownBuildPipeline { pipeline: String, build: String },

  /// Build references form a cycle.
  #[error("dependency cycle detected between pipelines")]
  CycleDetected,

  /// A custom directory or file failed validation.
  #[error("invalid filesystem node: {0}")]
  Node(#[from] NodeError),

  /// SELinux state other than enforcing, permissive or disabled.
  #[error("unknown SELinux mode '{0}'")]
  UnknownSelinuxMode(String),

  /// Filesystem configuration mode other than fstab or mount units.
  #[error("unknown filesystem configuration mode '{0}' (expected 'fstab' or 'mount-units')")]
  UnknownFsConfigMode(String),
}

impl ManifestError {
  /// The tier this error belongs to.
  pub fn kind(&self) -> ErrorKind {
    match self {
      ManifestError::UnknownSelinuxMode(_) | ManifestError::UnknownFsConfigMode(_) => ErrorKind::Configuration,
      _ => ErrorKind::ContractViolation,
    }
  }

  /// Whether this error must abort compilation.
  pub fn is_contract_violation(&self) -> bool {
    self.kind() == ErrorKind::ContractViolation
  }
}

pub type Result<T> = std::result::Result<T, ManifestError>;
