use super::binding::InputBinding;

/// State shared by every pipeline: identity, build reference, export flag and
/// the input binding window.
#[derive(Debug)]
pub struct Base {
  name: String,
  build: Option<String>,
  exported: bool,
  pub(crate) binding: InputBinding,
}

impl Base {
  /// A pipeline built inside the build root named `build`.
  pub fn new(name: &str, build: &str) -> Self {
    Self {
      name: name.to_string(),
      build: Some(build.to_string()),
      exported: false,
      binding: InputBinding::default(),
    }
  }

  /// A pipeline running directly on the host, i.e. a build root itself.
  pub fn root(name: &str) -> Self {
    Self {
      name: name.to_string(),
      build: None,
      exported: false,
      binding: InputBinding::default(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn build(&self) -> Option<&str> {
    self.build.as_deref()
  }

  pub fn is_exported(&self) -> bool {
    self.exported
  }

  pub(crate) fn mark_exported(&mut self) {
    self.exported = true;
  }
}
