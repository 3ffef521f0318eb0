//! Stages materializing custom directories and files.
//!
//! Directories produce one `mkdir` stage and, when any of them has an owner,
//! one `chown` stage. Files produce a `copy` stage fed from inline sources,
//! followed by `chmod` and `chown` stages for those carrying a mode or owner.

use std::collections::BTreeMap;

use serde::Serialize;

use super::stage::{Stage, StageInputs, StageOptions};
use super::users::{MkdirStagePath, new_mkdir_stage};
use crate::customizations::fsnode::{Directory, File, Owner};
use crate::util::hash::hash_bytes;

const INPUT_FILES: &str = "org.osbuild.files";
const ORIGIN_SOURCE: &str = "org.osbuild.source";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChownStageOptions {
  pub items: BTreeMap<String, ChownItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChownItem {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user: Option<Owner>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub group: Option<Owner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChmodStageOptions {
  pub items: BTreeMap<String, ChmodItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChmodItem {
  /// Octal mode string, e.g. `0644`.
  pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStageOptions {
  pub paths: Vec<CopyPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyPath {
  pub from: String,
  pub to: String,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub remove_destination: bool,
}

/// Empty reference entry; files are addressed by checksum alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReference {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesInput {
  #[serde(rename = "type")]
  pub kind: String,
  pub origin: String,
  pub references: BTreeMap<String, FileReference>,
}

impl FilesInput {
  fn for_checksum(checksum: &str) -> Self {
    let mut references = BTreeMap::new();
    references.insert(checksum.to_string(), FileReference::default());
    Self {
      kind: INPUT_FILES.to_string(),
      origin: ORIGIN_SOURCE.to_string(),
      references,
    }
  }
}

fn chown_stage<'a>(nodes: impl Iterator<Item = (&'a str, Option<&'a Owner>, Option<&'a Owner>)>) -> Option<Stage> {
  let items: BTreeMap<String, ChownItem> = nodes
    .filter(|(_, user, group)| user.is_some() || group.is_some())
    .map(|(path, user, group)| {
      (
        path.to_string(),
        ChownItem {
          user: user.cloned(),
          group: group.cloned(),
        },
      )
    })
    .collect();
  (!items.is_empty()).then(|| Stage::new("org.osbuild.chown", Some(StageOptions::Chown(ChownStageOptions { items }))))
}

/// Create `dirs`, then hand them to their owners.
pub fn gen_directory_nodes_stages(dirs: &[Directory]) -> Vec<Stage> {
  if dirs.is_empty() {
    return Vec::new();
  }

  let paths = dirs
    .iter()
    .map(|d| MkdirStagePath {
      path: d.path().to_string(),
      mode: d.mode(),
      parents: d.ensure_parents(),
      exist_ok: d.ensure_parents(),
    })
    .collect();

  let mut stages = vec![new_mkdir_stage(paths)];
  stages.extend(chown_stage(dirs.iter().map(|d| (d.path(), d.user(), d.group()))));
  stages
}

/// Copy `files` from their inline sources, then apply modes and owners.
pub fn gen_file_nodes_stages(files: &[File]) -> Vec<Stage> {
  if files.is_empty() {
    return Vec::new();
  }

  let mut paths = Vec::with_capacity(files.len());
  let mut inputs = BTreeMap::new();
  for file in files {
    let hash = hash_bytes(file.data());
    let input_name = format!("file-{hash}");
    paths.push(CopyPath {
      from: format!("input://{input_name}/{}", hash.checksum()),
      to: format!("tree://{}", file.path()),
      remove_destination: true,
    });
    inputs.insert(input_name, FilesInput::for_checksum(&hash.checksum()));
  }

  let mut stages = vec![
    Stage::new("org.osbuild.copy", Some(StageOptions::Copy(CopyStageOptions { paths })))
      .with_inputs(StageInputs::Files(inputs)),
  ];

  let modes: BTreeMap<String, ChmodItem> = files
    .iter()
    .filter_map(|f| {
      f.mode().map(|mode| {
        (
          f.path().to_string(),
          ChmodItem {
            mode: format!("0{mode:o}"),
          },
        )
      })
    })
    .collect();
  if !modes.is_empty() {
    stages.push(Stage::new(
      "org.osbuild.chmod",
      Some(StageOptions::Chmod(ChmodStageOptions { items: modes })),
    ));
  }

  stages.extend(chown_stage(files.iter().map(|f| (f.path(), f.user(), f.group()))));
  stages
}
