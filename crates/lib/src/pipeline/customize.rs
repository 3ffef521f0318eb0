//! Customization stages applied to a deployed tree.
//!
//! Every image pipeline variant turns its [`Customizations`] into stages
//! through [`customization_stages`], so ordering rules hold everywhere:
//!
//! 1. groups
//! 2. home directory roots, then users
//! 3. directories (mkdir, chown)
//! 4. files (copy, chmod, chown)
//! 5. OpenSCAP remediation
//! 6. SELinux labeling
//! 7. SELinux config state

use tracing::debug;

use crate::consts::HARDENING_RESULTS_DIR;
use crate::customizations::Customizations;
use crate::customizations::selinux::SelinuxState;
use crate::customizations::users::User;
use crate::osbuild::Stage;
use crate::osbuild::fsnode::{gen_directory_nodes_stages, gen_file_nodes_stages};
use crate::osbuild::mounts::DeviceMountContext;
use crate::osbuild::oscap::{OscapRemediationStageOptions, new_oscap_remediation_stage};
use crate::osbuild::selinux::{SelinuxStageOptions, new_selinux_config_stage, new_selinux_stage};
use crate::osbuild::users::{MkdirStagePath, gen_groups_stage, gen_users_stage, new_mkdir_stage};

/// Home directory roots that must exist before `users` are created.
///
/// Image-based systems keep home directories under `/var`: `/var/roothome` for
/// root and `/var/home` for everybody else.
pub fn build_homedir_paths(users: &[User]) -> Vec<MkdirStagePath> {
  let has_root = users.iter().any(User::is_root);
  let has_normal = users.iter().any(|u| !u.is_root());

  let mut paths = Vec::new();
  if has_root {
    paths.push(MkdirStagePath {
      path: "/var/roothome".to_string(),
      mode: Some(0o700),
      parents: false,
      exist_ok: true,
    });
  }
  if has_normal {
    paths.push(MkdirStagePath {
      path: "/var/home".to_string(),
      mode: Some(0o755),
      parents: false,
      exist_ok: true,
    });
  }
  paths
}

/// All stages realizing `custom`, each bound to `ctx`.
pub fn customization_stages(custom: &Customizations, ctx: &DeviceMountContext) -> Vec<Stage> {
  let mut stages = Vec::new();

  if !custom.groups.is_empty() {
    stages.push(gen_groups_stage(&custom.groups));
  }

  if !custom.users.is_empty() {
    stages.push(new_mkdir_stage(build_homedir_paths(&custom.users)));
    stages.push(gen_users_stage(&custom.users));
  }

  stages.extend(gen_directory_nodes_stages(&custom.directories));
  stages.extend(gen_file_nodes_stages(&custom.files));

  if let Some(config) = &custom.oscap {
    stages.push(new_oscap_remediation_stage(OscapRemediationStageOptions::new(
      HARDENING_RESULTS_DIR,
      config,
    )));
  }

  if !custom.selinux.is_empty() {
    stages.push(new_selinux_stage(
      SelinuxStageOptions::for_policy(&custom.selinux).excluding_sysroot(),
    ));
  }

  if !custom.selinux_mode.is_empty() {
    stages.push(new_selinux_config_stage(SelinuxState::from_mode(&custom.selinux_mode)));
  }

  debug!(
    stages = stages.len(),
    users = custom.users.len(),
    groups = custom.groups.len(),
    directories = custom.directories.len(),
    files = custom.files.len(),
    "generated customization stages"
  );

  stages.into_iter().map(|s| s.with_context(ctx)).collect()
}

#[cfg(test)]
mod tests {
  use tracing_test::traced_test;

  use super::*;
  use crate::customizations::fsnode::{Directory, File};
  use crate::customizations::oscap::RemediationConfig;
  use crate::customizations::users::Group;
  use crate::osbuild::mounts::Mount;

  fn kinds(stages: &[Stage]) -> Vec<&str> {
    stages.iter().map(|s| s.kind.as_str()).collect()
  }

  fn ctx() -> DeviceMountContext {
    let mut ctx = DeviceMountContext::default();
    ctx.mounts.push(Mount::bind("bind-ostree-deployment-to-tree", "mount://", "tree://"));
    ctx
  }

  #[test]
  fn homedirs_for_root_only() {
    let paths = build_homedir_paths(&[User::new("root")]);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].path, "/var/roothome");
    assert_eq!(paths[0].mode, Some(0o700));
    assert!(paths[0].exist_ok);
  }

  #[test]
  fn homedirs_for_normal_user_only() {
    let paths = build_homedir_paths(&[User::new("alice")]);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].path, "/var/home");
    assert_eq!(paths[0].mode, Some(0o755));
  }

  #[test]
  fn homedirs_for_both_in_fixed_order() {
    let paths = build_homedir_paths(&[User::new("alice"), User::new("root")]);
    let names: Vec<&str> = paths.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(names, vec!["/var/roothome", "/var/home"]);
  }

  #[test]
  fn no_homedirs_without_users() {
    assert!(build_homedir_paths(&[]).is_empty());
  }

  #[test]
  fn empty_customizations_emit_nothing() {
    assert!(customization_stages(&Customizations::default(), &ctx()).is_empty());
  }

  #[test]
  fn full_ordering() {
    let custom = Customizations {
      users: vec![User::new("alice")],
      groups: vec![Group::new("devs", Some(2000))],
      directories: vec![Directory::new("/etc/app").unwrap()],
      files: vec![File::new("/etc/app/config", "x").unwrap().with_mode(0o600).unwrap()],
      selinux: "targeted".into(),
      selinux_mode: "permissive".into(),
      oscap: Some(RemediationConfig {
        datastream: "/usr/share/xml/scap/ssg/content/ssg-cs9-ds.xml".into(),
        profile_id: "cis".into(),
        tailoring: None,
        compress_results: true,
      }),
    };

    let stages = customization_stages(&custom, &ctx());
    assert_eq!(
      kinds(&stages),
      vec![
        "org.osbuild.groups",
        "org.osbuild.mkdir",
        "org.osbuild.users",
        "org.osbuild.mkdir",
        "org.osbuild.copy",
        "org.osbuild.chmod",
        "org.osbuild.oscap.remediation",
        "org.osbuild.selinux",
        "org.osbuild.selinux.config",
      ]
    );
    assert!(stages.iter().all(|s| s.mounts == ctx().mounts));
  }

  #[test]
  fn directories_precede_files() {
    let custom = Customizations {
      directories: vec![Directory::new("/srv/app").unwrap()],
      files: vec![File::new("/srv/app/run.sh", "#!/bin/sh\n").unwrap()],
      ..Default::default()
    };
    let stages = customization_stages(&custom, &ctx());
    assert_eq!(kinds(&stages), vec!["org.osbuild.mkdir", "org.osbuild.copy"]);
  }

  #[traced_test]
  #[test]
  fn unknown_selinux_mode_becomes_enforcing() {
    let custom = Customizations {
      selinux_mode: "strict".into(),
      ..Default::default()
    };
    let stages = customization_stages(&custom, &ctx());
    let json = serde_json::to_value(&stages[0]).unwrap();
    assert_eq!(json["options"]["state"], "enforcing");
    assert!(logs_contain("falling back to enforcing SELinux state"));
  }
}
