//! Projection of a [`PartitionTable`] into the qemu assembler description.
//!
//! The projection is lossless and purely structural: every field of the table,
//! its partitions and their filesystems is carried over unchanged.

use serde::{Deserialize, Serialize};

use super::{Filesystem, Partition, PartitionTable};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QemuAssemblerOptions {
  pub size: u64,
  #[serde(default)]
  pub ptuuid: String,
  #[serde(default)]
  pub pttype: String,
  #[serde(default)]
  pub partitions: Vec<QemuPartition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QemuPartition {
  #[serde(skip_serializing_if = "is_zero")]
  pub start: u64,
  #[serde(skip_serializing_if = "is_zero")]
  pub size: u64,
  #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
  pub part_type: String,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub bootable: bool,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub uuid: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filesystem: Option<QemuFilesystem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QemuFilesystem {
  #[serde(rename = "type")]
  pub fs_type: String,
  pub uuid: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub label: String,
  pub mountpoint: String,
}

fn is_zero(n: &u64) -> bool {
  *n == 0
}

impl From<&PartitionTable> for QemuAssemblerOptions {
  fn from(pt: &PartitionTable) -> Self {
    Self {
      size: pt.size,
      ptuuid: pt.uuid.clone(),
      pttype: pt.pt_type.clone(),
      partitions: pt.partitions.iter().map(QemuPartition::from).collect(),
    }
  }
}

impl From<&Partition> for QemuPartition {
  fn from(p: &Partition) -> Self {
    Self {
      start: p.start,
      size: p.size,
      part_type: p.part_type.clone(),
      bootable: p.bootable,
      uuid: p.uuid.clone(),
      filesystem: p.filesystem.as_ref().map(QemuFilesystem::from),
    }
  }
}

impl From<&Filesystem> for QemuFilesystem {
  fn from(fs: &Filesystem) -> Self {
    Self {
      fs_type: fs.fs_type.clone(),
      uuid: fs.uuid.clone(),
      label: fs.label.clone(),
      mountpoint: fs.mountpoint.clone(),
    }
  }
}

impl PartitionTable {
  /// Describe this table for the qemu assembler.
  pub fn qemu_assembler_options(&self) -> QemuAssemblerOptions {
    QemuAssemblerOptions::from(self)
  }
}
