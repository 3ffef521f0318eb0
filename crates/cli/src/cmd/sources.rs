use std::path::Path;

use anyhow::{Context, Result};

use bootforge_lib::request::ImageRequest;

use crate::output::{OutputFormat, print_info, print_json, print_success, symbols};

pub fn cmd_sources(request: &Path, format: OutputFormat) -> Result<()> {
  let req = ImageRequest::load(request).with_context(|| format!("Failed to load request: {}", request.display()))?;
  let unresolved = req
    .unresolved_sources()
    .context("Failed to collect container sources")?;

  if format.is_json() {
    return print_json(&unresolved);
  }

  if unresolved.is_empty() {
    print_success("All container sources are resolved");
    return Ok(());
  }

  for (pipeline, sources) in &unresolved {
    print_info(&format!("Pipeline '{}' needs {} container(s):", pipeline, sources.len()));
    for source in sources {
      if source.name() == source.source {
        println!("  {}", source.source);
      } else {
        println!("  {} {} {}", source.source, symbols::ARROW, source.name());
      }
    }
  }
  Ok(())
}
