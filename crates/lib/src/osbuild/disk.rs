//! Stages creating and finishing the disk image file itself.

use serde::Serialize;

use super::devices::{Device, LoopbackDeviceOptions};
use super::stage::{Stage, StageOptions};
use crate::disk::{Mountable, PartitionTable};
use crate::error::{ManifestError, Result};

const DEVICE_NAME: &str = "device";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncateStageOptions {
  pub filename: String,
  /// Size in bytes, as a string.
  pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SfdiskStageOptions {
  pub label: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub uuid: String,
  pub partitions: Vec<SfdiskPartition>,
}

/// A partition as understood by sfdisk. `start` and `size` are in sectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SfdiskPartition {
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub bootable: bool,
  pub size: u64,
  pub start: u64,
  #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
  pub part_type: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub uuid: String,
}

/// Options of `org.osbuild.mkfs.{ext4,xfs,btrfs}` and `org.osbuild.mkswap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkfsStageOptions {
  pub uuid: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkfsFatStageOptions {
  /// FAT volume id: the filesystem uuid without dashes.
  pub volid: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

fn locked_disk(filename: &str) -> Device {
  Device::loopback(LoopbackDeviceOptions::new(filename).locked())
}

pub fn truncate_stage(filename: &str, size: u64) -> Stage {
  Stage::new(
    "org.osbuild.truncate",
    Some(StageOptions::Truncate(TruncateStageOptions {
      filename: filename.to_string(),
      size: size.to_string(),
    })),
  )
}

pub fn sfdisk_stage(pt: &PartitionTable, filename: &str) -> Stage {
  let partitions = pt
    .partitions
    .iter()
    .map(|p| SfdiskPartition {
      bootable: p.bootable,
      size: pt.bytes_to_sectors(p.size),
      start: pt.bytes_to_sectors(p.start),
      part_type: p.part_type.clone(),
      uuid: p.uuid.clone(),
    })
    .collect();

  Stage::new(
    "org.osbuild.sfdisk",
    Some(StageOptions::Sfdisk(SfdiskStageOptions {
      label: pt.pt_type.clone(),
      uuid: pt.uuid.clone(),
      partitions,
    })),
  )
  .with_device(DEVICE_NAME, locked_disk(filename))
}

fn non_empty(s: &str) -> Option<String> {
  (!s.is_empty()).then(|| s.to_string())
}

fn mkfs_stage(pt: &PartitionTable, filename: &str, m: &Mountable<'_>) -> Result<Stage> {
  let fs = m.filesystem;
  let label = non_empty(&fs.label);
  let (kind, options) = match fs.fs_type.as_str() {
    "ext4" | "xfs" | "btrfs" => (
      format!("org.osbuild.mkfs.{}", fs.fs_type),
      StageOptions::Mkfs(MkfsStageOptions {
        uuid: fs.uuid.clone(),
        label,
      }),
    ),
    "vfat" => (
      "org.osbuild.mkfs.fat".to_string(),
      StageOptions::MkfsFat(MkfsFatStageOptions {
        volid: fs.uuid.replace('-', ""),
        label,
      }),
    ),
    other => {
      return Err(ManifestError::UnsupportedFilesystem {
        fs_type: other.to_string(),
        mountpoint: fs.mountpoint.clone(),
      });
    }
  };

  let device = LoopbackDeviceOptions::new(filename)
    .with_range(pt.bytes_to_sectors(m.partition.start), pt.bytes_to_sectors(m.partition.size))
    .locked();
  Ok(Stage::new(&kind, Some(options)).with_device(DEVICE_NAME, Device::loopback(device)))
}

fn mkswap_stage(pt: &PartitionTable, filename: &str, start: u64, size: u64, uuid: &str, label: &str) -> Stage {
  let device = LoopbackDeviceOptions::new(filename)
    .with_range(pt.bytes_to_sectors(start), pt.bytes_to_sectors(size))
    .locked();
  Stage::new(
    "org.osbuild.mkswap",
    Some(StageOptions::Mkfs(MkfsStageOptions {
      uuid: uuid.to_string(),
      label: non_empty(label),
    })),
  )
  .with_device(DEVICE_NAME, Device::loopback(device))
}

/// One filesystem creation stage per filesystem in the table, in table order.
pub fn mkfs_stages(pt: &PartitionTable, filename: &str) -> Result<Vec<Stage>> {
  let mut stages = Vec::new();
  for (idx, partition) in pt.partitions.iter().enumerate() {
    let Some(fs) = &partition.filesystem else {
      continue;
    };
    if fs.fs_type == "swap" {
      stages.push(mkswap_stage(pt, filename, partition.start, partition.size, &fs.uuid, &fs.label));
      continue;
    }
    let m = Mountable {
      number: idx as u32 + 1,
      partition,
      filesystem: fs,
    };
    stages.push(mkfs_stage(pt, filename, &m)?);
  }
  Ok(stages)
}

/// Create the image file, partition it and create its filesystems.
pub fn gen_image_prepare_stages(pt: &PartitionTable, filename: &str) -> Result<Vec<Stage>> {
  let mut stages = vec![truncate_stage(filename, pt.size), sfdisk_stage(pt, filename)];
  stages.extend(mkfs_stages(pt, filename)?);
  Ok(stages)
}

/// Stages closing the image after deployment.
///
/// Plain partition tables carry no containers (LUKS, LVM) that would need
/// closing, so nothing is emitted for them.
pub fn gen_image_finish_stages(_pt: &PartitionTable, _filename: &str) -> Vec<Stage> {
  Vec::new()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::disk::{Filesystem, Partition};

  const MIB: u64 = 1024 * 1024;

  fn table() -> PartitionTable {
    PartitionTable {
      size: 2048 * MIB,
      uuid: "d209c89e-ea5e-4fbd-b161-b7a6ee1dd5d8".into(),
      pt_type: "gpt".into(),
      partitions: vec![
        Partition {
          start: MIB,
          size: MIB,
          part_type: "21686148-6449-6E6F-744E-656564454649".into(),
          bootable: true,
          ..Default::default()
        },
        Partition {
          start: 2 * MIB,
          size: 200 * MIB,
          part_type: "C12A7328-F81F-11D2-BA4B-00A0C93EC93B".into(),
          uuid: "68b2905b-df3e-4fb3-80fa-49d1e773aa33".into(),
          filesystem: Some(Filesystem {
            fs_type: "vfat".into(),
            uuid: "7B77-95E7".into(),
            label: "EFI-SYSTEM".into(),
            mountpoint: "/boot/efi".into(),
          }),
          ..Default::default()
        },
        Partition {
          start: 202 * MIB,
          size: 1846 * MIB,
          part_type: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".into(),
          uuid: "6264d520-3fb9-423f-8ab8-7a0a8e3d3562".into(),
          filesystem: Some(Filesystem {
            fs_type: "xfs".into(),
            uuid: "6e4ff95f-f662-45ee-a82a-bdf44a2d0b75".into(),
            label: "root".into(),
            mountpoint: "/".into(),
          }),
          ..Default::default()
        },
      ],
    }
  }

  #[test]
  fn prepare_stage_order() {
    let stages = gen_image_prepare_stages(&table(), "disk.img").unwrap();
    let kinds: Vec<&str> = stages.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(
      kinds,
      vec![
        "org.osbuild.truncate",
        "org.osbuild.sfdisk",
        "org.osbuild.mkfs.fat",
        "org.osbuild.mkfs.xfs"
      ]
    );
  }

  #[test]
  fn sfdisk_uses_sectors() {
    let stage = sfdisk_stage(&table(), "disk.img");
    let json = serde_json::to_value(&stage).unwrap();

    assert_eq!(json["options"]["label"], "gpt");
    let first = &json["options"]["partitions"][0];
    assert_eq!(first["start"], 2048);
    assert_eq!(first["size"], 2048);
    assert_eq!(first["bootable"], true);
    assert!(first.get("uuid").is_none());
    assert_eq!(json["devices"]["device"]["options"]["lock"], true);
  }

  #[test]
  fn fat_volid_drops_dashes() {
    let stages = mkfs_stages(&table(), "disk.img").unwrap();
    let json = serde_json::to_value(&stages[0]).unwrap();
    assert_eq!(
      json["options"],
      serde_json::json!({ "volid": "7B7795E7", "label": "EFI-SYSTEM" })
    );
    assert_eq!(json["devices"]["device"]["options"]["start"], 4096);
    assert_eq!(json["devices"]["device"]["options"]["size"], 409600);
  }

  #[test]
  fn swap_gets_mkswap() {
    let mut pt = table();
    pt.partitions.push(Partition {
      start: 2048 * MIB,
      size: 512 * MIB,
      filesystem: Some(Filesystem {
        fs_type: "swap".into(),
        uuid: "8a4bb1a6-5e0b-4b0d-9a2d-5d1fb4e2f3aa".into(),
        ..Default::default()
      }),
      ..Default::default()
    });
    let stages = mkfs_stages(&pt, "disk.img").unwrap();
    assert_eq!(stages.last().unwrap().kind, "org.osbuild.mkswap");
  }

  #[test]
  fn unknown_filesystem_is_rejected() {
    let mut pt = table();
    if let Some(fs) = pt.partitions[2].filesystem.as_mut() {
      fs.fs_type = "zfs".into();
    }
    let err = gen_image_prepare_stages(&pt, "disk.img").unwrap_err();
    assert!(matches!(err, ManifestError::UnsupportedFilesystem { .. }));
  }

  #[test]
  fn plain_tables_need_no_finish_stages() {
    assert!(gen_image_finish_stages(&table(), "disk.img").is_empty());
  }
}
