use super::Pipeline;
use super::base::Base;
use super::binding::Inputs;
use crate::consts::{BUILD_PIPELINE_NAME, CONTAINER_BUILD_RUNNER};
use crate::container::SourceSpec;
use crate::error::{ManifestError, Result};
use crate::osbuild::Stage;
use crate::osbuild::bootc::{ContainerDeployInputs, ContainersInput, new_container_deploy_stage};
use crate::osbuild::selinux::{SelinuxStageOptions, new_selinux_stage};

const INSTALL_EXEC_LABEL: &str = "system_u:object_r:install_exec_t:s0";

/// A build root deployed from a container image.
///
/// The tools that install the image (`bootc`, `ostree`) must be labeled as
/// installers for SELinux to let them write arbitrary labels to the target.
#[derive(Debug)]
pub struct BuildPipeline {
  base: Base,
  containers: Vec<SourceSpec>,
}

impl BuildPipeline {
  pub fn new(containers: Vec<SourceSpec>) -> Self {
    Self::with_name(BUILD_PIPELINE_NAME, containers)
  }

  pub fn with_name(name: &str, containers: Vec<SourceSpec>) -> Self {
    Self {
      base: Base::root(name),
      containers,
    }
  }
}

impl Pipeline for BuildPipeline {
  fn base(&self) -> &Base {
    &self.base
  }

  fn base_mut(&mut self) -> &mut Base {
    &mut self.base
  }

  fn container_sources(&self) -> &[SourceSpec] {
    &self.containers
  }

  fn runner(&self) -> Option<&str> {
    Some(CONTAINER_BUILD_RUNNER)
  }

  fn generate(&self, inputs: &Inputs) -> Result<Vec<Stage>> {
    let [spec] = inputs.containers.as_slice() else {
      return Err(ManifestError::InputCardinality {
        pipeline: self.name().to_string(),
        count: inputs.containers.len(),
      });
    };

    let deploy = new_container_deploy_stage(ContainerDeployInputs {
      images: ContainersInput::for_single_source(spec),
    });
    let relabel = new_selinux_stage(
      SelinuxStageOptions::for_policy("targeted")
        .excluding_sysroot()
        .with_label("/usr/bin/bootc", INSTALL_EXEC_LABEL)
        .with_label("/usr/bin/ostree", INSTALL_EXEC_LABEL),
    );
    Ok(vec![deploy, relabel])
  }
}
