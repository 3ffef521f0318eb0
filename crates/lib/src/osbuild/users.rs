use std::collections::BTreeMap;

use serde::Serialize;

use super::stage::{Stage, StageOptions};
use crate::customizations::users::{Group, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupsStageOptions {
  pub groups: BTreeMap<String, GroupsStageOptionsGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupsStageOptionsGroup {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsersStageOptions {
  pub users: BTreeMap<String, UsersStageOptionsUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsersStageOptionsUser {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub uid: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gid: Option<u32>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub groups: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub home: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub shell: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expiredate: Option<i64>,
}

impl From<&User> for UsersStageOptionsUser {
  fn from(user: &User) -> Self {
    Self {
      uid: user.uid,
      gid: user.gid,
      groups: user.groups.clone(),
      description: user.description.clone(),
      home: user.home.clone(),
      shell: user.shell.clone(),
      password: user.password.clone(),
      key: user.key.clone(),
      expiredate: user.expire_date,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkdirStageOptions {
  pub paths: Vec<MkdirStagePath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkdirStagePath {
  pub path: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mode: Option<u32>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub parents: bool,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub exist_ok: bool,
}

/// Declare groups. Later declarations of the same name win.
pub fn gen_groups_stage(groups: &[Group]) -> Stage {
  let groups = groups
    .iter()
    .map(|g| (g.name.clone(), GroupsStageOptionsGroup { gid: g.gid }))
    .collect();
  Stage::new("org.osbuild.groups", Some(StageOptions::Groups(GroupsStageOptions { groups })))
}

pub fn gen_users_stage(users: &[User]) -> Stage {
  let users = users
    .iter()
    .map(|u| (u.name.clone(), UsersStageOptionsUser::from(u)))
    .collect();
  Stage::new("org.osbuild.users", Some(StageOptions::Users(UsersStageOptions { users })))
}

pub fn new_mkdir_stage(paths: Vec<MkdirStagePath>) -> Stage {
  Stage::new("org.osbuild.mkdir", Some(StageOptions::Mkdir(MkdirStageOptions { paths })))
}
