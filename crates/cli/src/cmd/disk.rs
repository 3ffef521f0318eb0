use std::path::Path;

use anyhow::{Context, Result, bail};

use bootforge_lib::request::ImageRequest;

use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_warning};

pub fn cmd_disk(request: &Path, format: OutputFormat) -> Result<()> {
  let req = ImageRequest::load(request).with_context(|| format!("Failed to load request: {}", request.display()))?;
  let Some(pt) = &req.partition_table else {
    bail!("Request {} declares no partition table", request.display());
  };

  let opts = pt.qemu_assembler_options();
  if format.is_json() {
    return print_json(&opts);
  }

  print_stat("Type", &opts.pttype);
  print_stat("Size", &format_bytes(opts.size));
  if !opts.ptuuid.is_empty() {
    print_stat("UUID", &opts.ptuuid);
  }

  for (idx, part) in opts.partitions.iter().enumerate() {
    let fs = part
      .filesystem
      .as_ref()
      .map(|fs| format!("{} on {}", fs.fs_type, fs.mountpoint))
      .unwrap_or_else(|| "raw".to_string());
    println!(
      "{:>2}  start {:>10}  size {:>10}  {}",
      idx + 1,
      format_bytes(part.start),
      format_bytes(part.size),
      fs
    );
  }

  if pt.root_filesystem().is_none() {
    print_warning("No filesystem is mounted at '/'");
  }
  Ok(())
}
