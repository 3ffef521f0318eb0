use std::collections::BTreeMap;

use serde::Serialize;

use super::bootc::{BootcInstallToFilesystemOptions, ContainerDeployInputs};
use super::devices::Device;
use super::disk::{MkfsFatStageOptions, MkfsStageOptions, SfdiskStageOptions, TruncateStageOptions};
use super::fsnode::{ChmodStageOptions, ChownStageOptions, CopyStageOptions, FilesInput};
use super::fstab::{FstabStageOptions, SystemdStageOptions, SystemdUnitCreateStageOptions};
use super::mounts::{DeviceMountContext, Mount};
use super::oscap::OscapRemediationStageOptions;
use super::selinux::{SelinuxConfigStageOptions, SelinuxStageOptions};
use super::users::{GroupsStageOptions, MkdirStageOptions, UsersStageOptions};

/// Typed options payload of a stage.
///
/// Serialized without a tag: the executor identifies the payload by the
/// stage `type`, so each variant serializes as its inner options object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageOptions {
  Truncate(TruncateStageOptions),
  Sfdisk(SfdiskStageOptions),
  Mkfs(MkfsStageOptions),
  MkfsFat(MkfsFatStageOptions),
  BootcInstallToFilesystem(BootcInstallToFilesystemOptions),
  Fstab(FstabStageOptions),
  SystemdUnitCreate(SystemdUnitCreateStageOptions),
  Systemd(SystemdStageOptions),
  Groups(GroupsStageOptions),
  Users(UsersStageOptions),
  Mkdir(MkdirStageOptions),
  Chown(ChownStageOptions),
  Copy(CopyStageOptions),
  Chmod(ChmodStageOptions),
  Selinux(SelinuxStageOptions),
  SelinuxConfig(SelinuxConfigStageOptions),
  OscapRemediation(OscapRemediationStageOptions),
}

/// Typed inputs of a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageInputs {
  Containers(ContainerDeployInputs),
  Files(BTreeMap<String, FilesInput>),
}

/// A single build operation.
///
/// Stages are assembled fully, including their device/mount context, before
/// being appended to a pipeline, and are never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub inputs: Option<StageInputs>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub options: Option<StageOptions>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub devices: BTreeMap<String, Device>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub mounts: Vec<Mount>,
}

impl Stage {
  pub fn new(kind: &str, options: Option<StageOptions>) -> Self {
    Self {
      kind: kind.to_string(),
      inputs: None,
      options,
      devices: BTreeMap::new(),
      mounts: Vec::new(),
    }
  }

  pub fn with_inputs(mut self, inputs: StageInputs) -> Self {
    self.inputs = Some(inputs);
    self
  }

  pub fn with_device(mut self, name: &str, device: Device) -> Self {
    self.devices.insert(name.to_string(), device);
    self
  }

  /// Stamp the stage with a device/mount context.
  pub fn with_context(mut self, ctx: &DeviceMountContext) -> Self {
    self.devices = ctx.devices.clone();
    self.mounts = ctx.mounts.clone();
    self
  }
}
