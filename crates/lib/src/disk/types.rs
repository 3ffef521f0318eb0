use serde::{Deserialize, Serialize};

use crate::consts::SECTOR_SIZE;

/// A partition table of a disk image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
  /// Size of the disk in bytes.
  pub size: u64,
  #[serde(default)]
  pub uuid: String,
  /// Partition table type, e.g. `dos` or `gpt`.
  #[serde(rename = "type")]
  pub pt_type: String,
  /// Partitions, ordered by their position on disk.
  #[serde(default)]
  pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
  pub start: u64,
  pub size: u64,
  #[serde(rename = "type", default)]
  pub part_type: String,
  #[serde(default)]
  pub bootable: bool,
  /// ID of the partition. `dos` tables don't use real UUIDs, so this is opaque.
  #[serde(default)]
  pub uuid: String,
  /// `None` for raw partitions without a filesystem.
  #[serde(default)]
  pub filesystem: Option<Filesystem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
  #[serde(rename = "type")]
  pub fs_type: String,
  /// ID of the filesystem. `vfat` doesn't use real UUIDs, so this is opaque.
  #[serde(default)]
  pub uuid: String,
  #[serde(default)]
  pub label: String,
  #[serde(default)]
  pub mountpoint: String,
}

/// A filesystem reachable through a mountpoint, with its position in the table.
#[derive(Debug, Clone, Copy)]
pub struct Mountable<'a> {
  /// 1-based partition number as seen by the kernel.
  pub number: u32,
  pub partition: &'a Partition,
  pub filesystem: &'a Filesystem,
}

impl Filesystem {
  /// Swap areas have a filesystem entry but are never mounted.
  pub fn is_mountable(&self) -> bool {
    !self.mountpoint.is_empty() && self.fs_type != "swap"
  }
}

impl PartitionTable {
  /// All partitions carrying a mountable filesystem, in table order.
  pub fn mountables(&self) -> impl Iterator<Item = Mountable<'_>> {
    self.partitions.iter().enumerate().filter_map(|(idx, partition)| {
      let filesystem = partition.filesystem.as_ref()?;
      filesystem.is_mountable().then_some(Mountable {
        number: idx as u32 + 1,
        partition,
        filesystem,
      })
    })
  }

  /// The filesystem mounted at `/`, if any.
  pub fn root_filesystem(&self) -> Option<&Filesystem> {
    self.find_filesystem("/")
  }

  pub fn find_filesystem(&self, mountpoint: &str) -> Option<&Filesystem> {
    self
      .mountables()
      .find(|m| m.filesystem.mountpoint == mountpoint)
      .map(|m| m.filesystem)
  }

  /// Convert a byte offset into a sector count, rounding down.
  pub fn bytes_to_sectors(&self, bytes: u64) -> u64 {
    bytes / SECTOR_SIZE
  }
}
