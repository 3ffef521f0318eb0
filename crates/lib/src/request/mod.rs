//! Image requests: the configuration layer wiring pipelines together.
//!
//! A request is loaded from YAML or JSON (picked by file extension) and
//! compiled into a manifest with one build pipeline and one exported raw bootc
//! image pipeline.

mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::consts::{BUILD_PIPELINE_NAME, IMAGE_PIPELINE_NAME};
use crate::container::{SourceSpec, Spec};
use crate::error::ManifestError;
use crate::manifest::ManifestBuilder;
use crate::osbuild::fstab::FsConfigMode;
use crate::pipeline::{BuildPipeline, RawBootcImage};
use crate::util::hash::Hashable;

impl ImageRequest {
  /// Load a request, picking the format from the file extension.
  pub fn load(path: &Path) -> Result<Self, RequestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RequestError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
      Some("yaml") | Some("yml") => Self::from_yaml(&raw),
      Some("json") => Self::from_json(&raw),
      other => Err(RequestError::UnsupportedFormat(other.unwrap_or_default().to_string())),
    }
  }

  pub fn from_yaml(raw: &str) -> Result<Self, RequestError> {
    Ok(serde_yaml::from_str(raw)?)
  }

  pub fn from_json(raw: &str) -> Result<Self, RequestError> {
    Ok(serde_json::from_str(raw)?)
  }

  /// The filesystem configuration mode, degrading unknown values to fstab.
  pub fn fs_config_mode(&self) -> FsConfigMode {
    self.fs_config.parse().unwrap_or_else(|err: ManifestError| {
      warn!(mode = %self.fs_config, error = %err, "falling back to fstab");
      FsConfigMode::Fstab
    })
  }

  fn build_container(&self) -> Result<SourceSpec, RequestError> {
    self
      .build_container
      .clone()
      .or_else(|| self.containers.first().cloned())
      .ok_or(RequestError::NoContainers)
  }

  fn builder(&self) -> Result<(ManifestBuilder, crate::artifact::Artifact), RequestError> {
    self.customizations.validate()?;
    let build = BuildPipeline::new(vec![self.build_container()?]);

    let mut image = RawBootcImage::new(BUILD_PIPELINE_NAME, self.containers.clone(), self.platform);
    if let Some(filename) = &self.filename {
      image.set_filename(filename.clone());
    }
    image.partition_table = self.partition_table.clone();
    image.kernel_options_append = self.kernel_options_append.clone();
    image.customizations = self.customizations.clone();
    image.fs_config = self.fs_config_mode();
    let artifact = image.export();

    let mut builder = ManifestBuilder::new();
    builder.add(build)?;
    builder.add(image)?;
    Ok((builder, artifact))
  }

  /// Resolved containers per pipeline, with the build root falling back to
  /// the image's containers when it has no explicit container of its own.
  fn resolved_containers(&self) -> BTreeMap<String, Vec<Spec>> {
    let mut resolved = self.resolved.clone();
    if self.build_container.is_none()
      && !resolved.contains_key(BUILD_PIPELINE_NAME)
      && let Some(image) = resolved.get(IMAGE_PIPELINE_NAME).cloned()
    {
      resolved.insert(BUILD_PIPELINE_NAME.to_string(), image);
    }
    resolved
  }

  /// Container references still lacking a resolution, per pipeline name.
  pub fn unresolved_sources(&self) -> Result<BTreeMap<String, Vec<SourceSpec>>, RequestError> {
    let (builder, _) = self.builder()?;
    let resolved = self.resolved_containers();
    Ok(
      builder
        .container_sources()
        .into_iter()
        .filter(|(name, _)| resolved.get(name).is_none_or(|specs| specs.is_empty()))
        .collect(),
    )
  }

  /// Compile the request into a manifest and its exported artifact.
  pub fn compile(&self) -> Result<Compiled, RequestError> {
    let (mut builder, artifact) = self.builder()?;
    let manifest = builder.serialize(&self.resolved_containers())?;

    match manifest.compute_hash() {
      Ok(hash) => info!(
        hash = %hash,
        pipelines = manifest.pipelines.len(),
        filename = %artifact.filename,
        "compiled manifest"
      ),
      Err(err) => warn!(error = %err, "failed to hash manifest"),
    }

    Ok(Compiled { manifest, artifact })
  }
}
