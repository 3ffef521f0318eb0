//! Implementation of the `bootforge compile` command.
//!
//! Loads an image request, compiles it and writes the manifest as JSON, either
//! to stdout or to the file given with `--output`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use bootforge_lib::request::ImageRequest;
use bootforge_lib::util::hash::Hashable;

use crate::output::{print_stat, print_success, symbols};

pub fn cmd_compile(request: &Path, output: Option<&Path>) -> Result<()> {
  let req = ImageRequest::load(request).with_context(|| format!("Failed to load request: {}", request.display()))?;
  let compiled = req
    .compile()
    .with_context(|| format!("Failed to compile request: {}", request.display()))?;
  debug!(pipelines = compiled.manifest.pipelines.len(), "request compiled");

  let json = compiled
    .manifest
    .to_json_pretty()
    .context("Failed to serialize manifest")?;

  let Some(path) = output else {
    println!("{}", json);
    return Ok(());
  };

  fs::write(path, format!("{json}\n")).with_context(|| format!("Failed to write manifest: {}", path.display()))?;

  let hash = compiled.manifest.compute_hash().context("Failed to compute manifest hash")?;
  print_success(&format!("Compiled {} {} {}", request.display(), symbols::ARROW, path.display()));
  print_stat("Manifest", &hash.0);
  print_stat("Pipelines", &compiled.manifest.pipelines.len().to_string());
  print_stat(
    "Artifact",
    &format!("{} ({})", compiled.artifact.filename, compiled.artifact.pipeline),
  );
  Ok(())
}
