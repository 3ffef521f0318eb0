//! Pipelines: named producers of stages.
//!
//! Every pipeline carries a [`Base`] (name, build reference, export flag and
//! input binding) and implements [`Pipeline::generate`], which turns the bound
//! inputs into stages. The binding protocol itself is provided by the trait's
//! default methods so that all pipelines enforce it identically.
//!
//! # Submodules
//!
//! - [`base`] - Shared pipeline state
//! - [`binding`] - The input binding window
//! - [`build`] - Build root deployed from a container
//! - [`customize`] - Customization stages shared by image pipelines
//! - [`raw_bootc`] - Raw disk image installed with bootc

pub mod base;
pub mod binding;
pub mod build;
pub mod customize;
pub mod raw_bootc;

pub use base::Base;
pub use binding::{InputBinding, Inputs};
pub use build::BuildPipeline;
pub use raw_bootc::RawBootcImage;

use tracing::debug;

use crate::container::SourceSpec;
use crate::error::Result;
use crate::osbuild::{self, Stage};

pub trait Pipeline {
  fn base(&self) -> &Base;

  fn base_mut(&mut self) -> &mut Base;

  /// Container references that must be resolved before generation.
  fn container_sources(&self) -> &[SourceSpec];

  /// Produce the stages of this pipeline from resolved `inputs`.
  fn generate(&self, inputs: &binding::Inputs) -> Result<Vec<Stage>>;

  fn runner(&self) -> Option<&str> {
    None
  }

  /// Inline file contents embedded in the manifest sources.
  fn inline_data(&self) -> Vec<Vec<u8>> {
    Vec::new()
  }

  fn name(&self) -> &str {
    self.base().name()
  }

  fn build(&self) -> Option<&str> {
    self.base().build()
  }

  fn is_exported(&self) -> bool {
    self.base().is_exported()
  }

  fn bind_inputs(&mut self, inputs: binding::Inputs) -> Result<()> {
    let name = self.name().to_string();
    self.base_mut().binding.bind(&name, inputs)
  }

  fn unbind_inputs(&mut self) -> Result<()> {
    let name = self.name().to_string();
    self.base_mut().binding.unbind(&name)
  }

  /// Generate stages from the bound inputs, consuming them.
  fn generate_stages(&mut self) -> Result<Vec<Stage>> {
    let name = self.name().to_string();
    let inputs = self.base_mut().binding.take(&name)?;
    let stages = self.generate(&inputs)?;
    debug!(pipeline = %name, stages = stages.len(), "generated stages");
    Ok(stages)
  }

  /// Generate the wire form of this pipeline.
  fn serialize(&mut self) -> Result<osbuild::Pipeline> {
    let stages = self.generate_stages()?;
    let mut pipeline = osbuild::Pipeline::new(self.name(), self.build(), self.runner());
    pipeline.add_stages(stages);
    Ok(pipeline)
  }
}
