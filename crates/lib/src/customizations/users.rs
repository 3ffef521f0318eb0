use serde::{Deserialize, Serialize};

/// A user account to create in the image.
///
/// The password, when set, is written as given: callers supply an already
/// crypted hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  /// SSH public key installed into the user's `authorized_keys`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub home: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shell: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub groups: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uid: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gid: Option<u32>,
  /// Account expiry in days since the epoch.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expire_date: Option<i64>,
}

impl User {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn is_root(&self) -> bool {
    self.name == "root"
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gid: Option<u32>,
}

impl Group {
  pub fn new(name: impl Into<String>, gid: Option<u32>) -> Self {
    Self { name: name.into(), gid }
  }
}
