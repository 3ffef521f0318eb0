//! The serialized manifest document handed to the executor.
//!
//! # Structure
//!
//! ```json
//! {
//!   "version": "2",
//!   "pipelines": [ { "name": "build", "runner": "org.osbuild.linux", "stages": [...] }, ... ],
//!   "sources": {
//!     "org.osbuild.inline": { "items": { "sha256:...": { "encoding": "base64", "data": "..." } } },
//!     "org.osbuild.skopeo": { "items": { "sha256:...": { "image": { "name": "...", "digest": "..." } } } }
//!   }
//! }
//! ```
//!
//! All maps are [`BTreeMap`]s so the document, and therefore its hash, is
//! byte-identical across runs on the same input.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::stage::Stage;
use crate::consts::MANIFEST_VERSION;
use crate::container::Spec;
use crate::util::hash::{Hashable, hash_bytes};

/// A serialized pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
  pub name: String,
  /// Build root reference, `name:<pipeline>`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub build: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub runner: Option<String>,
  pub stages: Vec<Stage>,
}

impl Pipeline {
  pub fn new(name: &str, build: Option<&str>, runner: Option<&str>) -> Self {
    Self {
      name: name.to_string(),
      build: build.map(|b| format!("name:{b}")),
      runner: runner.map(str::to_string),
      stages: Vec::new(),
    }
  }

  pub fn add_stages(&mut self, stages: impl IntoIterator<Item = Stage>) {
    self.stages.extend(stages);
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineSourceItem {
  pub encoding: String,
  pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineSource {
  pub items: BTreeMap<String, InlineSourceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkopeoImage {
  pub name: String,
  pub digest: String,
  #[serde(rename = "tls-verify", skip_serializing_if = "Option::is_none")]
  pub tls_verify: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkopeoSourceItem {
  pub image: SkopeoImage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkopeoSource {
  pub items: BTreeMap<String, SkopeoSourceItem>,
}

/// Content the executor fetches before running any pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sources {
  #[serde(rename = "org.osbuild.inline", skip_serializing_if = "Option::is_none")]
  pub inline: Option<InlineSource>,
  #[serde(rename = "org.osbuild.skopeo", skip_serializing_if = "Option::is_none")]
  pub skopeo: Option<SkopeoSource>,
}

impl Sources {
  /// Embed inline file contents keyed by checksum. Identical blobs collapse.
  pub fn add_inline(&mut self, data: &[u8]) {
    let items = &mut self.inline.get_or_insert_with(InlineSource::default).items;
    items.insert(
      hash_bytes(data).checksum(),
      InlineSourceItem {
        encoding: "base64".to_string(),
        data: STANDARD.encode(data),
      },
    );
  }

  /// Pull a resolved container image by digest, keyed by image id.
  pub fn add_container(&mut self, spec: &Spec) {
    let items = &mut self.skopeo.get_or_insert_with(SkopeoSource::default).items;
    items.insert(
      spec.image_id.clone(),
      SkopeoSourceItem {
        image: SkopeoImage {
          name: spec.source.clone(),
          digest: spec.digest.clone(),
          tls_verify: spec.tls_verify,
        },
      },
    );
  }
}

/// A complete manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
  pub version: String,
  pub pipelines: Vec<Pipeline>,
  pub sources: Sources,
}

impl Default for Manifest {
  fn default() -> Self {
    Self {
      version: MANIFEST_VERSION.to_string(),
      pipelines: Vec::new(),
      sources: Sources::default(),
    }
  }
}

impl Manifest {
  pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
    self.pipelines.iter().find(|p| p.name == name)
  }

  pub fn to_json_pretty(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}

impl Hashable for Manifest {}
