//! Filesystem configuration of the deployed image: `/etc/fstab` or systemd
//! mount units.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use super::stage::{Stage, StageOptions};
use crate::disk::{Filesystem, PartitionTable};
use crate::error::{ManifestError, Result};

const FAT_MOUNT_OPTIONS: &str = "defaults,uid=0,gid=0,umask=077,shortname=winnt";

/// How mounted filesystems are described to the booted system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FsConfigMode {
  #[default]
  Fstab,
  MountUnits,
}

impl FromStr for FsConfigMode {
  type Err = ManifestError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "" | "fstab" => Ok(Self::Fstab),
      "mount-units" => Ok(Self::MountUnits),
      other => Err(ManifestError::UnknownFsConfigMode(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FstabStageOptions {
  pub filesystems: Vec<FstabEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FstabEntry {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub uuid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  pub vfs_type: String,
  pub path: String,
  pub options: String,
  pub freq: u32,
  pub passno: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemdUnitCreateStageOptions {
  pub filename: String,
  #[serde(rename = "unit-type")]
  pub unit_type: String,
  #[serde(rename = "unit-path")]
  pub unit_path: String,
  pub config: MountUnitConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountUnitConfig {
  pub mount: MountSection,
  pub install: InstallSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountSection {
  pub what: String,
  pub r#where: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub r#type: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstallSection {
  pub wanted_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemdStageOptions {
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub enabled_services: Vec<String>,
}

fn mount_options(fs: &Filesystem) -> &'static str {
  if fs.fs_type == "vfat" { FAT_MOUNT_OPTIONS } else { "defaults" }
}

fn non_empty(s: &str) -> Option<String> {
  (!s.is_empty()).then(|| s.to_string())
}

pub fn fstab_stage(pt: &PartitionTable) -> Stage {
  let filesystems = pt
    .mountables()
    .map(|m| {
      let fs = m.filesystem;
      FstabEntry {
        uuid: non_empty(&fs.uuid),
        label: non_empty(&fs.label),
        vfs_type: fs.fs_type.clone(),
        path: fs.mountpoint.clone(),
        options: mount_options(fs).to_string(),
        freq: 0,
        passno: if fs.mountpoint == "/" { 1 } else { 2 },
      }
    })
    .collect();
  Stage::new("org.osbuild.fstab", Some(StageOptions::Fstab(FstabStageOptions { filesystems })))
}

/// Escape a mount path into a systemd unit name, as `systemd-escape --path`.
pub fn systemd_escape_path(path: &str) -> String {
  let trimmed = path.trim_matches('/');
  if trimmed.is_empty() {
    return "-".to_string();
  }

  let mut escaped = String::with_capacity(trimmed.len());
  for (idx, c) in trimmed.chars().enumerate() {
    match c {
      '/' => escaped.push('-'),
      '.' if idx == 0 => escaped.push_str("\\x2e"),
      c if c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.') => escaped.push(c),
      c => {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).bytes() {
          let _ = write!(escaped, "\\x{b:02x}");
        }
      }
    }
  }
  escaped
}

fn what(fs: &Filesystem) -> String {
  if !fs.uuid.is_empty() {
    format!("UUID={}", fs.uuid)
  } else {
    format!("LABEL={}", fs.label)
  }
}

pub fn mount_unit_stages(pt: &PartitionTable) -> Vec<Stage> {
  let mut stages = Vec::new();
  let mut units = Vec::new();

  for m in pt.mountables() {
    let fs = m.filesystem;
    let filename = format!("{}.mount", systemd_escape_path(&fs.mountpoint));
    let options = SystemdUnitCreateStageOptions {
      filename: filename.clone(),
      unit_type: "system".to_string(),
      unit_path: "etc".to_string(),
      config: MountUnitConfig {
        mount: MountSection {
          what: what(fs),
          r#where: fs.mountpoint.clone(),
          r#type: fs.fs_type.clone(),
          options: mount_options(fs).to_string(),
        },
        install: InstallSection {
          wanted_by: vec!["local-fs.target".to_string()],
        },
      },
    };
    stages.push(Stage::new(
      "org.osbuild.systemd.unit.create",
      Some(StageOptions::SystemdUnitCreate(options)),
    ));
    units.push(filename);
  }

  stages.push(Stage::new(
    "org.osbuild.systemd",
    Some(StageOptions::Systemd(SystemdStageOptions {
      enabled_services: units,
    })),
  ));
  stages
}

/// Stages describing the mounted filesystems of `pt` to the booted system.
pub fn filesystem_config_stages(pt: &PartitionTable, mode: FsConfigMode) -> Vec<Stage> {
  match mode {
    FsConfigMode::Fstab => vec![fstab_stage(pt)],
    FsConfigMode::MountUnits => mount_unit_stages(pt),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::disk::Partition;

  fn table() -> PartitionTable {
    let fs = |fs_type: &str, uuid: &str, mountpoint: &str| {
      Some(Filesystem {
        fs_type: fs_type.into(),
        uuid: uuid.into(),
        mountpoint: mountpoint.into(),
        ..Default::default()
      })
    };
    PartitionTable {
      size: 1 << 32,
      pt_type: "gpt".into(),
      partitions: vec![
        Partition {
          filesystem: fs("vfat", "7B77-95E7", "/boot/efi"),
          ..Default::default()
        },
        Partition {
          filesystem: fs("ext4", "a1b2", "/"),
          ..Default::default()
        },
        Partition {
          filesystem: fs("xfs", "c3d4", "/var/lib/my-app"),
          ..Default::default()
        },
      ],
      ..Default::default()
    }
  }

  #[test]
  fn parses_modes() {
    assert_eq!("fstab".parse::<FsConfigMode>().unwrap(), FsConfigMode::Fstab);
    assert_eq!("".parse::<FsConfigMode>().unwrap(), FsConfigMode::Fstab);
    assert_eq!("mount-units".parse::<FsConfigMode>().unwrap(), FsConfigMode::MountUnits);
    assert!(matches!(
      "autofs".parse::<FsConfigMode>(),
      Err(ManifestError::UnknownFsConfigMode(_))
    ));
  }

  #[test]
  fn escapes_paths_like_systemd() {
    assert_eq!(systemd_escape_path("/"), "-");
    assert_eq!(systemd_escape_path("/boot/efi"), "boot-efi");
    assert_eq!(systemd_escape_path("/var/lib/my-app"), "var-lib-my\\x2dapp");
    assert_eq!(systemd_escape_path("/srv/.cache"), "srv-.cache");
  }

  #[test]
  fn fstab_lists_mountables_in_table_order() {
    let stages = filesystem_config_stages(&table(), FsConfigMode::Fstab);
    assert_eq!(stages.len(), 1);

    let json = serde_json::to_value(&stages[0]).unwrap();
    let entries = json["options"]["filesystems"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["options"], FAT_MOUNT_OPTIONS);
    assert_eq!(entries[1]["path"], "/");
    assert_eq!(entries[1]["passno"], 1);
    assert_eq!(entries[2]["passno"], 2);
    assert!(entries[1].get("label").is_none());
  }

  #[test]
  fn mount_units_end_with_enablement() {
    let stages = filesystem_config_stages(&table(), FsConfigMode::MountUnits);
    let kinds: Vec<&str> = stages.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(
      kinds,
      vec![
        "org.osbuild.systemd.unit.create",
        "org.osbuild.systemd.unit.create",
        "org.osbuild.systemd.unit.create",
        "org.osbuild.systemd"
      ]
    );

    let root = serde_json::to_value(&stages[1]).unwrap();
    assert_eq!(root["options"]["filename"], "-.mount");
    assert_eq!(root["options"]["config"]["Mount"]["What"], "UUID=a1b2");
    assert_eq!(root["options"]["config"]["Mount"]["Where"], "/");
    assert_eq!(
      root["options"]["config"]["Install"]["WantedBy"],
      serde_json::json!(["local-fs.target"])
    );

    let enable = serde_json::to_value(&stages[3]).unwrap();
    assert_eq!(
      enable["options"]["enabled_services"],
      serde_json::json!(["boot-efi.mount", "-.mount", "var-lib-my\\x2dapp.mount"])
    );
  }
}
