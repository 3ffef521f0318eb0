//! Custom directories and files placed into the image.
//!
//! Nodes built through the constructors are validated right away. Nodes read
//! from a request are validated as a whole with [`Directory::validate`] and
//! [`File::validate`] before compilation: paths must be absolute and
//! normalized, modes must fit into the permission bits and owners must be
//! plausible account names or numeric ids.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted mode: permission bits plus setuid/setgid/sticky.
const MAX_MODE: u32 = 0o7777;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
  /// The node has no path at all.
  #[error("path must not be empty")]
  EmptyPath,

  /// The path does not start at `/`.
  #[error("path '{0}' must be absolute")]
  RelativePath(String),

  /// The path has empty, `.` or `..` components or a trailing slash.
  #[error("path '{0}' must be normalized")]
  UncleanPath(String),

  /// The node is the filesystem root itself.
  #[error("path '/' cannot be customized")]
  RootPath,

  /// The mode has bits beyond permissions, setuid, setgid and sticky.
  #[error("mode {mode:#o} of '{path}' exceeds 0o7777")]
  InvalidMode { path: String, mode: u32 },

  /// The owner name is not a valid account name.
  #[error("invalid user or group name '{0}'")]
  InvalidOwner(String),
}

/// Owner of a node, by account name or numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Owner {
  Id(u32),
  Name(String),
}

impl Owner {
  fn validate(&self) -> Result<(), NodeError> {
    if let Owner::Name(name) = self {
      let valid = !name.is_empty()
        && name.len() <= 32
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
      if !valid {
        return Err(NodeError::InvalidOwner(name.clone()));
      }
    }
    Ok(())
  }
}

fn validate_owners(user: Option<&Owner>, group: Option<&Owner>) -> Result<(), NodeError> {
  user.into_iter().chain(group).try_for_each(Owner::validate)
}

fn validate_path(path: &str) -> Result<(), NodeError> {
  if path.is_empty() {
    return Err(NodeError::EmptyPath);
  }
  if !path.starts_with('/') {
    return Err(NodeError::RelativePath(path.to_string()));
  }
  if path == "/" {
    return Err(NodeError::RootPath);
  }
  let unclean = path.ends_with('/') || path[1..].split('/').any(|c| c.is_empty() || c == "." || c == "..");
  if unclean {
    return Err(NodeError::UncleanPath(path.to_string()));
  }
  Ok(())
}

fn validate_mode(path: &str, mode: u32) -> Result<(), NodeError> {
  if mode > MAX_MODE {
    return Err(NodeError::InvalidMode {
      path: path.to_string(),
      mode,
    });
  }
  Ok(())
}

/// A directory to create.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDirectory")]
pub struct Directory {
  path: String,
  mode: Option<u32>,
  user: Option<Owner>,
  group: Option<Owner>,
  ensure_parents: bool,
}

impl Directory {
  pub fn new(path: impl Into<String>) -> Result<Self, NodeError> {
    let path = path.into();
    validate_path(&path)?;
    Ok(Self {
      path,
      mode: None,
      user: None,
      group: None,
      ensure_parents: false,
    })
  }

  pub fn with_mode(mut self, mode: u32) -> Result<Self, NodeError> {
    validate_mode(&self.path, mode)?;
    self.mode = Some(mode);
    Ok(self)
  }

  pub fn with_owner(mut self, user: Option<Owner>, group: Option<Owner>) -> Result<Self, NodeError> {
    validate_owners(user.as_ref(), group.as_ref())?;
    self.user = user;
    self.group = group;
    Ok(self)
  }

  /// Check path, mode and owners.
  pub fn validate(&self) -> Result<(), NodeError> {
    validate_path(&self.path)?;
    if let Some(mode) = self.mode {
      validate_mode(&self.path, mode)?;
    }
    validate_owners(self.user.as_ref(), self.group.as_ref())
  }

  /// Create missing parent directories as well.
  pub fn with_parents(mut self) -> Self {
    self.ensure_parents = true;
    self
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn mode(&self) -> Option<u32> {
    self.mode
  }

  pub fn user(&self) -> Option<&Owner> {
    self.user.as_ref()
  }

  pub fn group(&self) -> Option<&Owner> {
    self.group.as_ref()
  }

  pub fn ensure_parents(&self) -> bool {
    self.ensure_parents
  }
}

/// A regular file with inline content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawFile")]
pub struct File {
  path: String,
  mode: Option<u32>,
  user: Option<Owner>,
  group: Option<Owner>,
  data: Vec<u8>,
}

impl File {
  pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self, NodeError> {
    let path = path.into();
    validate_path(&path)?;
    Ok(Self {
      path,
      mode: None,
      user: None,
      group: None,
      data: data.into(),
    })
  }

  pub fn with_mode(mut self, mode: u32) -> Result<Self, NodeError> {
    validate_mode(&self.path, mode)?;
    self.mode = Some(mode);
    Ok(self)
  }

  pub fn with_owner(mut self, user: Option<Owner>, group: Option<Owner>) -> Result<Self, NodeError> {
    validate_owners(user.as_ref(), group.as_ref())?;
    self.user = user;
    self.group = group;
    Ok(self)
  }

  /// Check path, mode and owners.
  pub fn validate(&self) -> Result<(), NodeError> {
    validate_path(&self.path)?;
    if let Some(mode) = self.mode {
      validate_mode(&self.path, mode)?;
    }
    validate_owners(self.user.as_ref(), self.group.as_ref())
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn mode(&self) -> Option<u32> {
    self.mode
  }

  pub fn user(&self) -> Option<&Owner> {
    self.user.as_ref()
  }

  pub fn group(&self) -> Option<&Owner> {
    self.group.as_ref()
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }
}

#[derive(Deserialize)]
struct RawDirectory {
  path: String,
  #[serde(default)]
  mode: Option<u32>,
  #[serde(default)]
  user: Option<Owner>,
  #[serde(default)]
  group: Option<Owner>,
  #[serde(default)]
  ensure_parents: bool,
}

impl From<RawDirectory> for Directory {
  fn from(raw: RawDirectory) -> Self {
    Self {
      path: raw.path,
      mode: raw.mode,
      user: raw.user,
      group: raw.group,
      ensure_parents: raw.ensure_parents,
    }
  }
}

#[derive(Deserialize)]
struct RawFile {
  path: String,
  #[serde(default)]
  mode: Option<u32>,
  #[serde(default)]
  user: Option<Owner>,
  #[serde(default)]
  group: Option<Owner>,
  #[serde(default)]
  data: String,
}

impl From<RawFile> for File {
  fn from(raw: RawFile) -> Self {
    Self {
      path: raw.path,
      mode: raw.mode,
      user: raw.user,
      group: raw.group,
      data: raw.data.into_bytes(),
    }
  }
}
