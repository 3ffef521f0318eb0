//! Mounts and the device/mount context of stages operating on a disk image.
//!
//! [`gen_bootupd_devices_mounts`] computes how a stage reaches the filesystems
//! of a partitioned image file: one partition-scanning loopback device over the
//! whole file and one mount per mountable filesystem. The result depends only
//! on its arguments, so independently computed contexts compare equal.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::devices::{Device, LoopbackDeviceOptions};
use crate::disk::{Filesystem, PartitionTable};
use crate::error::{ManifestError, Result};
use crate::platform::Platform;

const MOUNT_BIND: &str = "org.osbuild.bind";
const MOUNT_OSTREE_DEPLOYMENT: &str = "org.osbuild.ostree.deployment";

/// Name of the whole-disk device in a bootupd context.
pub const DISK_DEVICE_NAME: &str = "disk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mount {
  pub name: String,
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub partition: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub options: Option<MountOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MountOptions {
  Bind(BindMountOptions),
  OstreeDeployment(OstreeDeploymentMountOptions),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindMountOptions {
  pub source: String,
}

/// Where the ostree deployment mount finds its deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OstreeMountSource {
  Mount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OstreeDeploymentMountOptions {
  pub source: OstreeMountSource,
  pub deployment: OstreeDeploymentRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OstreeDeploymentRef {
  pub default: bool,
}

impl Mount {
  /// Bind-mount `source` onto `target` (e.g. `mount://` onto `tree://`).
  pub fn bind(name: &str, source: &str, target: &str) -> Self {
    Self {
      name: name.to_string(),
      kind: MOUNT_BIND.to_string(),
      source: None,
      target: Some(target.to_string()),
      partition: None,
      options: Some(MountOptions::Bind(BindMountOptions {
        source: source.to_string(),
      })),
    }
  }

  /// Mount the default ostree deployment found under `source`.
  pub fn ostree_deployment_default(name: &str, source: OstreeMountSource) -> Self {
    Self {
      name: name.to_string(),
      kind: MOUNT_OSTREE_DEPLOYMENT.to_string(),
      source: None,
      target: None,
      partition: None,
      options: Some(MountOptions::OstreeDeployment(OstreeDeploymentMountOptions {
        source,
        deployment: OstreeDeploymentRef { default: true },
      })),
    }
  }

  /// Mount a filesystem found on a partition of `device`.
  fn filesystem(device: &str, partition: u32, fs: &Filesystem) -> Result<Self> {
    let kind = match fs.fs_type.as_str() {
      "ext4" => "org.osbuild.ext4",
      "xfs" => "org.osbuild.xfs",
      "vfat" => "org.osbuild.fat",
      "btrfs" => "org.osbuild.btrfs",
      other => {
        return Err(ManifestError::UnsupportedFilesystem {
          fs_type: other.to_string(),
          mountpoint: fs.mountpoint.clone(),
        });
      }
    };
    Ok(Self {
      name: mount_name(&fs.mountpoint),
      kind: kind.to_string(),
      source: Some(device.to_string()),
      target: Some(fs.mountpoint.clone()),
      partition: Some(partition),
      options: None,
    })
  }
}

/// `/` becomes `root`, `/boot/efi` becomes `boot-efi`.
fn mount_name(mountpoint: &str) -> String {
  let trimmed = mountpoint.trim_matches('/');
  if trimmed.is_empty() {
    "root".to_string()
  } else {
    trimmed.replace('/', "-")
  }
}

/// Devices and mounts attached to a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceMountContext {
  pub devices: BTreeMap<String, Device>,
  pub mounts: Vec<Mount>,
}

impl DeviceMountContext {
  /// Extend a raw-disk context so that `tree://` points at the deployed OS.
  ///
  /// After deployment the filesystem root of interest is the default ostree
  /// deployment on the disk, bind-mounted over the tree view of the stage.
  pub fn with_deployment_root(mut self) -> Self {
    self
      .mounts
      .push(Mount::ostree_deployment_default("ostree.deployment", OstreeMountSource::Mount));
    self
      .mounts
      .push(Mount::bind("bind-ostree-deployment-to-tree", "mount://", "tree://"));
    self
  }

  pub fn mount_targets(&self) -> impl Iterator<Item = &str> {
    self.mounts.iter().filter_map(|m| m.target.as_deref())
  }
}

/// Compute the devices and mounts reaching the filesystems of `filename`.
///
/// Mounts are sorted by target so that parents are mounted before children.
/// Fails when the table has no root filesystem or when a filesystem type has no
/// mount driver.
pub fn gen_bootupd_devices_mounts(
  filename: &str,
  pt: &PartitionTable,
  platform: &Platform,
) -> Result<DeviceMountContext> {
  let mut devices = BTreeMap::new();
  devices.insert(
    DISK_DEVICE_NAME.to_string(),
    Device::loopback(LoopbackDeviceOptions::new(filename).with_partscan()),
  );

  let mut mounts = pt
    .mountables()
    .map(|m| Mount::filesystem(DISK_DEVICE_NAME, m.number, m.filesystem))
    .collect::<Result<Vec<_>>>()?;
  mounts.sort_by(|a, b| a.target.cmp(&b.target));

  let ctx = DeviceMountContext { devices, mounts };

  if !ctx.mount_targets().any(|t| t == "/") {
    return Err(ManifestError::NoRootFilesystem);
  }

  debug!(filename = %filename, platform = %platform, mounts = ctx.mounts.len(), "computed bootupd devices and mounts");
  Ok(ctx)
}

/// Check that `ctx` mounts everything bootupd needs on `platform`.
pub fn validate_bootupd_mounts(ctx: &DeviceMountContext, platform: &Platform) -> Result<()> {
  let mut required = vec!["/"];
  if platform.requires_esp() {
    required.push("/boot/efi");
  }

  let missing: Vec<String> = required
    .into_iter()
    .filter(|req| !ctx.mount_targets().any(|t| t == *req))
    .map(str::to_string)
    .collect();
  if !missing.is_empty() {
    return Err(ManifestError::MissingBootMounts { missing });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::disk::Partition;
  use crate::platform::BootMode;
  use crate::platform::arch::Arch;

  const MIB: u64 = 1024 * 1024;

  fn uefi() -> Platform {
    Platform::new(Arch::X86_64, BootMode::Uefi)
  }

  fn part(start: u64, size: u64, fs_type: &str, mountpoint: &str) -> Partition {
    Partition {
      start,
      size,
      filesystem: Some(Filesystem {
        fs_type: fs_type.into(),
        uuid: format!("uuid-{}", mount_name(mountpoint)),
        mountpoint: mountpoint.into(),
        ..Default::default()
      }),
      ..Default::default()
    }
  }

  fn table() -> PartitionTable {
    PartitionTable {
      size: 10 * 1024 * MIB,
      pt_type: "gpt".into(),
      partitions: vec![
        Partition {
          start: MIB,
          size: MIB,
          part_type: "21686148-6449-6E6F-744E-656564454649".into(),
          ..Default::default()
        },
        part(2 * MIB, 500 * MIB, "vfat", "/boot/efi"),
        part(502 * MIB, 1024 * MIB, "ext4", "/boot"),
        part(1526 * MIB, 8000 * MIB, "xfs", "/"),
      ],
      ..Default::default()
    }
  }

  #[test]
  fn mounts_are_sorted_by_target() {
    let ctx = gen_bootupd_devices_mounts("disk.img", &table(), &uefi()).unwrap();

    let targets: Vec<&str> = ctx.mount_targets().collect();
    assert_eq!(targets, vec!["/", "/boot", "/boot/efi"]);

    let names: Vec<&str> = ctx.mounts.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["root", "boot", "boot-efi"]);

    let partitions: Vec<Option<u32>> = ctx.mounts.iter().map(|m| m.partition).collect();
    assert_eq!(partitions, vec![Some(4), Some(3), Some(2)]);
    assert_eq!(ctx.mounts[0].kind, "org.osbuild.xfs");
    assert_eq!(ctx.mounts[2].kind, "org.osbuild.fat");
  }

  #[test]
  fn single_partscan_loopback_device() {
    let ctx = gen_bootupd_devices_mounts("disk.img", &table(), &uefi()).unwrap();
    assert_eq!(ctx.devices.len(), 1);
    let disk = &ctx.devices[DISK_DEVICE_NAME];
    assert!(disk.options.partscan);
    assert!(!disk.options.lock);
    assert_eq!(disk.options.filename, "disk.img");
  }

  #[test]
  fn independent_computations_are_equal() {
    let a = gen_bootupd_devices_mounts("disk.img", &table(), &uefi()).unwrap();
    let b = gen_bootupd_devices_mounts("disk.img", &table(), &uefi()).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn missing_root_fails() {
    let mut pt = table();
    pt.partitions.pop();
    let err = gen_bootupd_devices_mounts("disk.img", &pt, &uefi()).unwrap_err();
    assert!(matches!(err, ManifestError::NoRootFilesystem));
    assert!(err.is_contract_violation());
  }

  #[test]
  fn uefi_requires_esp_mount() {
    let mut pt = table();
    pt.partitions.remove(1);
    let ctx = gen_bootupd_devices_mounts("disk.img", &pt, &uefi()).unwrap();

    let err = validate_bootupd_mounts(&ctx, &uefi()).unwrap_err();
    match err {
      ManifestError::MissingBootMounts { missing } => assert_eq!(missing, vec!["/boot/efi".to_string()]),
      other => panic!("unexpected error: {other}"),
    }

    let legacy = Platform::new(Arch::X86_64, BootMode::Legacy);
    assert!(validate_bootupd_mounts(&ctx, &legacy).is_ok());
  }

  #[test]
  fn deployed_context_passes_validation() {
    let ctx = gen_bootupd_devices_mounts("disk.img", &table(), &uefi())
      .unwrap()
      .with_deployment_root();
    assert!(validate_bootupd_mounts(&ctx, &uefi()).is_ok());
  }

  #[test]
  fn unsupported_filesystem_fails() {
    let mut pt = table();
    pt.partitions[2] = part(502 * MIB, 1024 * MIB, "zfs", "/boot");
    let err = gen_bootupd_devices_mounts("disk.img", &pt, &uefi()).unwrap_err();
    assert!(matches!(err, ManifestError::UnsupportedFilesystem { ref fs_type, .. } if fs_type == "zfs"));
  }

  #[test]
  fn deployment_root_appends_ostree_and_bind_mounts() {
    let raw = gen_bootupd_devices_mounts("disk.img", &table(), &uefi()).unwrap();
    let deployed = raw.clone().with_deployment_root();

    assert_eq!(deployed.mounts.len(), raw.mounts.len() + 2);
    assert_eq!(deployed.devices, raw.devices);

    let json = serde_json::to_value(&deployed.mounts[3..]).unwrap();
    assert_eq!(
      json,
      serde_json::json!([
        {
          "name": "ostree.deployment",
          "type": "org.osbuild.ostree.deployment",
          "options": { "source": "mount", "deployment": { "default": true } }
        },
        {
          "name": "bind-ostree-deployment-to-tree",
          "type": "org.osbuild.bind",
          "target": "tree://",
          "options": { "source": "mount://" }
        }
      ])
    );
  }
}
