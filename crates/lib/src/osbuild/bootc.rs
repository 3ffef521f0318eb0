use std::collections::BTreeMap;

use serde::Serialize;

use super::mounts::{DeviceMountContext, validate_bootupd_mounts};
use super::stage::{Stage, StageInputs, StageOptions};
use crate::container::Spec;
use crate::error::Result;
use crate::platform::Platform;

const INPUT_CONTAINERS: &str = "org.osbuild.containers";
const ORIGIN_SOURCE: &str = "org.osbuild.source";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerReference {
  pub name: String,
}

/// Container images fetched by the executor, keyed by image id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainersInput {
  #[serde(rename = "type")]
  pub kind: String,
  pub origin: String,
  pub references: BTreeMap<String, ContainerReference>,
}

impl ContainersInput {
  pub fn for_single_source(spec: &Spec) -> Self {
    let mut references = BTreeMap::new();
    references.insert(
      spec.image_id.clone(),
      ContainerReference {
        name: spec.local_name.clone(),
      },
    );
    Self {
      kind: INPUT_CONTAINERS.to_string(),
      origin: ORIGIN_SOURCE.to_string(),
      references,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerDeployInputs {
  pub images: ContainersInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootcInstallToFilesystemOptions {
  #[serde(rename = "kernel-args", skip_serializing_if = "Vec::is_empty")]
  pub kernel_args: Vec<String>,
  /// Image reference the installed system tracks for updates.
  #[serde(rename = "target-imgref", skip_serializing_if = "String::is_empty")]
  pub target_imgref: String,
}

/// Install the bound container onto the mounted filesystems of the image.
///
/// Fails when `ctx` lacks a mount the bootloader installation needs on
/// `platform`.
pub fn new_bootc_install_stage(
  options: BootcInstallToFilesystemOptions,
  inputs: ContainerDeployInputs,
  ctx: &DeviceMountContext,
  platform: &Platform,
) -> Result<Stage> {
  validate_bootupd_mounts(ctx, platform)?;
  Ok(
    Stage::new(
      "org.osbuild.bootc.install-to-filesystem",
      Some(StageOptions::BootcInstallToFilesystem(options)),
    )
    .with_inputs(StageInputs::Containers(inputs))
    .with_context(ctx),
  )
}

/// Deploy a container image as the tree of the pipeline.
pub fn new_container_deploy_stage(inputs: ContainerDeployInputs) -> Stage {
  Stage::new("org.osbuild.container-deploy", None).with_inputs(StageInputs::Containers(inputs))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::osbuild::devices::{Device, LoopbackDeviceOptions};
  use crate::osbuild::mounts::Mount;
  use crate::platform::BootMode;
  use crate::platform::arch::Arch;

  fn spec() -> Spec {
    Spec {
      source: "example.registry/os:latest".into(),
      digest: "sha256:1111".into(),
      image_id: "sha256:2222".into(),
      local_name: "example.registry/os:latest".into(),
      list_digest: None,
      tls_verify: None,
    }
  }

  fn root_only_ctx() -> DeviceMountContext {
    let mut ctx = DeviceMountContext::default();
    ctx.devices.insert(
      "disk".into(),
      Device::loopback(LoopbackDeviceOptions::new("disk.img").with_partscan()),
    );
    ctx.mounts.push(Mount {
      name: "root".into(),
      kind: "org.osbuild.ext4".into(),
      source: Some("disk".into()),
      target: Some("/".into()),
      partition: Some(2),
      options: None,
    });
    ctx
  }

  #[test]
  fn containers_input_is_keyed_by_image_id() {
    let input = ContainersInput::for_single_source(&spec());
    let json = serde_json::to_value(&input).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "type": "org.osbuild.containers",
        "origin": "org.osbuild.source",
        "references": { "sha256:2222": { "name": "example.registry/os:latest" } }
      })
    );
  }

  #[test]
  fn install_stage_carries_context_and_options() {
    let options = BootcInstallToFilesystemOptions {
      kernel_args: vec!["console=ttyS0".into()],
      target_imgref: "example.registry/os:latest".into(),
    };
    let inputs = ContainerDeployInputs {
      images: ContainersInput::for_single_source(&spec()),
    };
    let legacy = Platform::new(Arch::X86_64, BootMode::Legacy);
    let stage = new_bootc_install_stage(options, inputs, &root_only_ctx(), &legacy).unwrap();

    let json = serde_json::to_value(&stage).unwrap();
    assert_eq!(json["type"], "org.osbuild.bootc.install-to-filesystem");
    assert_eq!(json["options"]["kernel-args"], serde_json::json!(["console=ttyS0"]));
    assert_eq!(json["options"]["target-imgref"], "example.registry/os:latest");
    assert!(json["inputs"]["images"]["references"]["sha256:2222"].is_object());
    assert_eq!(json["mounts"][0]["target"], "/");
  }

  #[test]
  fn empty_options_are_omitted() {
    let json = serde_json::to_value(BootcInstallToFilesystemOptions::default()).unwrap();
    assert_eq!(json, serde_json::json!({}));
  }

  #[test]
  fn install_stage_validates_mounts() {
    let inputs = ContainerDeployInputs {
      images: ContainersInput::for_single_source(&spec()),
    };
    let uefi = Platform::new(Arch::X86_64, BootMode::Uefi);
    let result = new_bootc_install_stage(Default::default(), inputs, &root_only_ctx(), &uefi);
    assert!(result.is_err());
  }
}
