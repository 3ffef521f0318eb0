use serde::Serialize;

const DEVICE_LOOPBACK: &str = "org.osbuild.loopback";

/// A device made available to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
  #[serde(rename = "type")]
  pub kind: String,
  pub options: LoopbackDeviceOptions,
}

impl Device {
  pub fn loopback(options: LoopbackDeviceOptions) -> Self {
    Self {
      kind: DEVICE_LOOPBACK.to_string(),
      options,
    }
  }
}

/// Options of a loopback device over the image file.
///
/// `start` and `size` are expressed in sectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopbackDeviceOptions {
  pub filename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub size: Option<u64>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub lock: bool,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub partscan: bool,
}

impl LoopbackDeviceOptions {
  pub fn new(filename: &str) -> Self {
    Self {
      filename: filename.to_string(),
      start: None,
      size: None,
      lock: false,
      partscan: false,
    }
  }

  pub fn locked(mut self) -> Self {
    self.lock = true;
    self
  }

  pub fn with_partscan(mut self) -> Self {
    self.partscan = true;
    self
  }

  /// Restrict the device to a range of the file, in sectors.
  pub fn with_range(mut self, start: u64, size: u64) -> Self {
    self.start = Some(start);
    self.size = Some(size);
    self
  }
}
