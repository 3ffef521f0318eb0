//! Container image references.
//!
//! A pipeline declares the images it needs as [`SourceSpec`]s. Resolving them
//! to content-addressed [`Spec`]s (registry lookups, digest pinning) happens
//! outside of this crate; the resolved specs are handed back through the input
//! binding of each pipeline.

use serde::{Deserialize, Serialize};

/// An unresolved container reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
  /// Pull reference, e.g. `quay.io/centos-bootc/centos-bootc:stream9`.
  pub source: String,
  /// Name the image is known by inside the built image. Defaults to `source`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tls_verify: Option<bool>,
}

impl SourceSpec {
  pub fn new(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      name: None,
      tls_verify: None,
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// The reference name of the image, falling back to the pull reference.
  pub fn name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.source)
  }
}

/// A resolved, content-addressed container reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
  pub source: String,
  /// Manifest digest, e.g. `sha256:...`.
  pub digest: String,
  /// Image (config) id, e.g. `sha256:...`.
  pub image_id: String,
  /// Local name of the image inside the build.
  pub local_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub list_digest: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tls_verify: Option<bool>,
}
