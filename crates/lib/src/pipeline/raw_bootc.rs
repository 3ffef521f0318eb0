//! Raw disk image installed from a bootable container.
//!
//! There is no intermediate tree: `bootc install to-filesystem` writes the
//! deployment straight into the partitioned image, and every later stage works
//! on the mounted deployment inside that image.

use tracing::debug;

use super::Pipeline;
use super::base::Base;
use super::binding::Inputs;
use super::customize::customization_stages;
use crate::artifact::Artifact;
use crate::consts::{DEFAULT_IMAGE_FILENAME, IMAGE_PIPELINE_NAME};
use crate::container::SourceSpec;
use crate::customizations::Customizations;
use crate::disk::PartitionTable;
use crate::error::{ManifestError, Result};
use crate::osbuild::Stage;
use crate::osbuild::bootc::{
  BootcInstallToFilesystemOptions, ContainerDeployInputs, ContainersInput, new_bootc_install_stage,
};
use crate::osbuild::disk::{gen_image_finish_stages, gen_image_prepare_stages};
use crate::osbuild::fstab::{FsConfigMode, filesystem_config_stages};
use crate::osbuild::mounts::gen_bootupd_devices_mounts;
use crate::platform::Platform;

#[derive(Debug)]
pub struct RawBootcImage {
  base: Base,
  filename: String,
  platform: Platform,
  containers: Vec<SourceSpec>,

  pub partition_table: Option<PartitionTable>,
  pub kernel_options_append: Vec<String>,
  /// Users, files and security settings. Users and groups become unmanaged
  /// local state of the installed system.
  pub customizations: Customizations,
  pub fs_config: FsConfigMode,
}

impl RawBootcImage {
  /// An image pipeline built inside the build root named `build`.
  pub fn new(build: &str, containers: Vec<SourceSpec>, platform: Platform) -> Self {
    Self {
      base: Base::new(IMAGE_PIPELINE_NAME, build),
      filename: DEFAULT_IMAGE_FILENAME.to_string(),
      platform,
      containers,
      partition_table: None,
      kernel_options_append: Vec::new(),
      customizations: Customizations::default(),
      fs_config: FsConfigMode::default(),
    }
  }

  pub fn filename(&self) -> &str {
    &self.filename
  }

  pub fn set_filename(&mut self, filename: impl Into<String>) {
    self.filename = filename.into();
  }

  /// Mark the image as a deliverable of the manifest.
  pub fn export(&mut self) -> Artifact {
    self.base.mark_exported();
    Artifact::new(self.name(), &self.filename)
  }
}

impl Pipeline for RawBootcImage {
  fn base(&self) -> &Base {
    &self.base
  }

  fn base_mut(&mut self) -> &mut Base {
    &mut self.base
  }

  fn container_sources(&self) -> &[SourceSpec] {
    &self.containers
  }

  fn inline_data(&self) -> Vec<Vec<u8>> {
    self.customizations.inline_data()
  }

  fn generate(&self, inputs: &Inputs) -> Result<Vec<Stage>> {
    let pt = self
      .partition_table
      .as_ref()
      .ok_or_else(|| ManifestError::MissingPartitionTable {
        pipeline: self.name().to_string(),
      })?;

    let mut stages = gen_image_prepare_stages(pt, &self.filename)?;

    let [spec] = inputs.containers.as_slice() else {
      return Err(ManifestError::InputCardinality {
        pipeline: self.name().to_string(),
        count: inputs.containers.len(),
      });
    };

    let options = BootcInstallToFilesystemOptions {
      kernel_args: self.kernel_options_append.clone(),
      target_imgref: self
        .containers
        .first()
        .map(|c| c.name().to_string())
        .unwrap_or_default(),
    };
    let deploy_inputs = ContainerDeployInputs {
      images: ContainersInput::for_single_source(spec),
    };
    let raw_ctx = gen_bootupd_devices_mounts(&self.filename, pt, &self.platform)?;
    stages.push(new_bootc_install_stage(options, deploy_inputs, &raw_ctx, &self.platform)?);

    stages.extend(gen_image_finish_stages(pt, &self.filename));

    // everything from here on works on the deployment inside the image
    let deployed_ctx = gen_bootupd_devices_mounts(&self.filename, pt, &self.platform)?.with_deployment_root();

    stages.extend(
      filesystem_config_stages(pt, self.fs_config)
        .into_iter()
        .map(|s| s.with_context(&deployed_ctx)),
    );
    stages.extend(customization_stages(&self.customizations, &deployed_ctx));

    debug!(
      pipeline = %self.name(),
      filename = %self.filename,
      platform = %self.platform,
      stages = stages.len(),
      "generated raw bootc image stages"
    );
    Ok(stages)
  }
}
