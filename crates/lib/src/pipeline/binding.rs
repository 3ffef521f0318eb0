//! Two-phase binding of resolved content into a pipeline.
//!
//! A pipeline declares unresolved [`SourceSpec`](crate::container::SourceSpec)s
//! up front. Resolution happens elsewhere; the resolved [`Spec`]s are bound
//! into the pipeline for the duration of one stage generation:
//!
//! ```text
//! Unbound --bind--> Bound --take--> Consumed --unbind--> Unbound
//!    \________________________ unbind _____________________/
//! ```
//!
//! Binding twice, unbinding or generating without a binding, and generating
//! twice in one window are contract violations.

use crate::container::Spec;
use crate::error::{ManifestError, Result};

/// Resolved content handed to a pipeline for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
  pub containers: Vec<Spec>,
}

impl Inputs {
  pub fn new(containers: Vec<Spec>) -> Self {
    Self { containers }
  }
}

#[derive(Debug, Default)]
enum State {
  #[default]
  Unbound,
  Bound(Inputs),
  Consumed,
}

/// The binding window of a single pipeline.
#[derive(Debug, Default)]
pub struct InputBinding {
  state: State,
}

impl InputBinding {
  pub fn is_active(&self) -> bool {
    !matches!(self.state, State::Unbound)
  }

  pub fn bind(&mut self, pipeline: &str, inputs: Inputs) -> Result<()> {
    if self.is_active() {
      return Err(ManifestError::BindingAlreadyActive {
        pipeline: pipeline.to_string(),
      });
    }
    self.state = State::Bound(inputs);
    Ok(())
  }

  pub fn unbind(&mut self, pipeline: &str) -> Result<()> {
    if !self.is_active() {
      return Err(ManifestError::NoActiveBinding {
        pipeline: pipeline.to_string(),
      });
    }
    self.state = State::Unbound;
    Ok(())
  }

  /// Hand out the bound inputs. The window stays open until unbound.
  pub fn take(&mut self, pipeline: &str) -> Result<Inputs> {
    match std::mem::replace(&mut self.state, State::Consumed) {
      State::Bound(inputs) => Ok(inputs),
      State::Consumed => Err(ManifestError::InputsAlreadyConsumed {
        pipeline: pipeline.to_string(),
      }),
      State::Unbound => {
        self.state = State::Unbound;
        Err(ManifestError::NoActiveBinding {
          pipeline: pipeline.to_string(),
        })
      }
    }
  }
}
