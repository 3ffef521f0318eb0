//! Image customizations.
//!
//! Everything a user can declare on top of the OS image: accounts, custom
//! filesystem nodes and security settings. A pipeline owns one
//! [`Customizations`] value and turns it into stages exactly once, through
//! [`crate::pipeline::customize::customization_stages`].
//!
//! # Submodules
//!
//! - [`fsnode`] - Custom directories and files
//! - [`oscap`] - OpenSCAP remediation configuration
//! - [`selinux`] - SELinux state parsing
//! - [`users`] - Users and groups

pub mod fsnode;
pub mod oscap;
pub mod selinux;
pub mod users;

use serde::Deserialize;

use crate::error::Result;
use fsnode::{Directory, File};
use oscap::RemediationConfig;
use users::{Group, User};

/// All customizations applied to a deployed image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Customizations {
  pub users: Vec<User>,
  pub groups: Vec<Group>,
  /// Created before `files`, so files may be placed inside them.
  pub directories: Vec<Directory>,
  pub files: Vec<File>,
  /// SELinux policy name (e.g. `targeted`). Enables labeling when non-empty.
  pub selinux: String,
  /// SELinux state written to the config when non-empty.
  pub selinux_mode: String,
  pub oscap: Option<RemediationConfig>,
}

impl Customizations {
  /// Validate every custom directory and file.
  pub fn validate(&self) -> Result<()> {
    for dir in &self.directories {
      dir.validate()?;
    }
    for file in &self.files {
      file.validate()?;
    }
    Ok(())
  }

  /// Inline content of all custom files, in declaration order.
  pub fn inline_data(&self) -> Vec<Vec<u8>> {
    self.files.iter().map(|f| f.data().to_vec()).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{ErrorKind, ManifestError};
  use super::fsnode::NodeError;

  #[test]
  fn deserializes_full_customizations() {
    let yaml = r#"
users:
  - name: root
    key: ssh-ed25519 AAAA
  - name: alice
    groups: [wheel]
groups:
  - name: devs
    gid: 2000
directories:
  - path: /etc/app
files:
  - path: /etc/app/config.toml
    data: "debug = false\n"
selinux: targeted
selinux_mode: permissive
oscap:
  datastream: /usr/share/xml/scap/ssg/content/ssg-cs9-ds.xml
  profile_id: xccdf_org.ssgproject.content_profile_cis
"#;
    let custom: Customizations = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(custom.users.len(), 2);
    assert!(custom.users[0].is_root());
    assert_eq!(custom.groups[0].gid, Some(2000));
    assert_eq!(custom.files[0].data(), b"debug = false\n");
    assert_eq!(custom.selinux, "targeted");
    assert!(custom.validate().is_ok());
  }

  #[test]
  fn default_has_no_inline_data() {
    assert!(Customizations::default().inline_data().is_empty());
  }

  #[test]
  fn invalid_nodes_are_contract_violations() {
    let yaml = r#"
directories:
  - path: /etc/app
files:
  - path: etc/app/config.toml
    data: "x"
"#;
    let custom: Customizations = serde_yaml::from_str(yaml).unwrap();
    let err = custom.validate().unwrap_err();
    assert!(matches!(err, ManifestError::Node(NodeError::RelativePath(_))));
    assert_eq!(err.kind(), ErrorKind::ContractViolation);
  }

  #[test]
  fn inline_data_keeps_declaration_order() {
    let custom = Customizations {
      files: vec![
        File::new("/etc/b", "second").unwrap(),
        File::new("/etc/a", "first").unwrap(),
      ],
      ..Default::default()
    };
    assert_eq!(custom.inline_data(), vec![b"second".to_vec(), b"first".to_vec()]);
  }
}
