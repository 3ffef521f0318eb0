use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::container::{SourceSpec, Spec};
use crate::customizations::Customizations;
use crate::disk::PartitionTable;
use crate::error::ManifestError;
use crate::osbuild::Manifest;
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum RequestError {
  /// The request file could not be read.
  #[error("failed to read request '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The request is not valid YAML for an [`ImageRequest`].
  #[error("invalid YAML request: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// The request is not valid JSON for an [`ImageRequest`].
  #[error("invalid JSON request: {0}")]
  Json(#[from] serde_json::Error),

  /// The file extension names no known format.
  #[error("unsupported request format '{0}' (expected .yaml, .yml or .json)")]
  UnsupportedFormat(String),

  /// Neither `containers` nor `build_container` is set.
  #[error("request declares no container image")]
  NoContainers,

  /// Compilation of the manifest failed.
  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// Declarative description of a raw bootc disk image.
///
/// # Example
///
/// ```yaml
/// platform:
///   arch: x86_64
///   boot_mode: uefi
/// containers:
///   - source: quay.io/centos-bootc/centos-bootc:stream9
/// resolved:
///   image:
///     - source: quay.io/centos-bootc/centos-bootc:stream9
///       digest: sha256:...
///       image_id: sha256:...
///       local_name: quay.io/centos-bootc/centos-bootc:stream9
/// partition_table:
///   size: 10737418240
///   type: gpt
///   partitions: [...]
/// customizations:
///   users:
///     - name: admin
///       groups: [wheel]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
  #[serde(default)]
  pub filename: Option<String>,
  pub platform: Platform,
  /// Container deployed as build root. Defaults to the first of `containers`.
  #[serde(default)]
  pub build_container: Option<SourceSpec>,
  /// Containers installed into the image; the first one is installed.
  pub containers: Vec<SourceSpec>,
  /// Resolved containers per pipeline name. When the build root uses the
  /// image container, `build` falls back to the specs resolved for `image`.
  #[serde(default)]
  pub resolved: BTreeMap<String, Vec<Spec>>,
  #[serde(default)]
  pub partition_table: Option<PartitionTable>,
  #[serde(default)]
  pub kernel_options_append: Vec<String>,
  /// `fstab` (default) or `mount-units`.
  #[serde(default)]
  pub fs_config: String,
  #[serde(default)]
  pub customizations: Customizations,
}

/// Result of compiling an [`ImageRequest`].
#[derive(Debug, Clone)]
pub struct Compiled {
  pub manifest: Manifest,
  pub artifact: Artifact,
}
