//! End-to-end compilation of a raw bootc disk image manifest.

use std::collections::BTreeMap;

use bootforge_lib::container::{SourceSpec, Spec};
use bootforge_lib::customizations::fsnode::{Directory, File};
use bootforge_lib::customizations::users::{Group, User};
use bootforge_lib::disk::{Filesystem, Partition, PartitionTable};
use bootforge_lib::error::ManifestError;
use bootforge_lib::manifest::ManifestBuilder;
use bootforge_lib::osbuild::Manifest;
use bootforge_lib::pipeline::{BuildPipeline, Inputs, Pipeline, RawBootcImage};
use bootforge_lib::platform::arch::Arch;
use bootforge_lib::platform::{BootMode, Platform};
use bootforge_lib::util::hash::Hashable;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;
const IMAGE_REF: &str = "example.registry/os:latest";

fn table() -> PartitionTable {
  PartitionTable {
    size: 10 * GIB,
    uuid: "d209c89e-ea5e-4fbd-b161-b7a6ee1dd5d8".into(),
    pt_type: "gpt".into(),
    partitions: vec![
      Partition {
        start: MIB,
        size: 500 * MIB,
        part_type: "BC13C2FF-59E6-4262-A352-B275FD6F7172".into(),
        uuid: "a8d9c59d-3b3f-4c36-9aa1-1d3c3c5a7f40".into(),
        ..Default::default()
      },
      Partition {
        start: 501 * MIB,
        size: 9 * GIB + 512 * MIB,
        part_type: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".into(),
        uuid: "6264d520-3fb9-423f-8ab8-7a0a8e3d3562".into(),
        filesystem: Some(Filesystem {
          fs_type: "ext4".into(),
          uuid: "0194fdc2-fa2f-4cc0-81d3-ff12045b73c8".into(),
          label: "root".into(),
          mountpoint: "/".into(),
        }),
        ..Default::default()
      },
    ],
  }
}

fn spec() -> Spec {
  Spec {
    source: IMAGE_REF.into(),
    digest: "sha256:c5f8d3c5f1b8d1c6a7b5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3".into(),
    image_id: "sha256:2f5e1a9c0d4b3a2918f7e6d5c4b3a2f1e0d9c8b7a6f5e4d3c2b1a0f9e8d7c6b5".into(),
    local_name: IMAGE_REF.into(),
    list_digest: None,
    tls_verify: None,
  }
}

fn legacy() -> Platform {
  Platform::new(Arch::X86_64, BootMode::Legacy)
}

fn image() -> RawBootcImage {
  let mut image = RawBootcImage::new("build", vec![SourceSpec::new(IMAGE_REF)], legacy());
  image.partition_table = Some(table());
  image
}

fn resolved() -> BTreeMap<String, Vec<Spec>> {
  let mut containers = BTreeMap::new();
  containers.insert("build".to_string(), vec![spec()]);
  containers.insert("image".to_string(), vec![spec()]);
  containers
}

fn compile(image: RawBootcImage) -> Result<Manifest, ManifestError> {
  let mut builder = ManifestBuilder::new();
  builder.add(BuildPipeline::new(vec![SourceSpec::new(IMAGE_REF)]))?;
  builder.add(image)?;
  builder.serialize(&resolved())
}

fn stage_kinds(manifest: &Manifest, pipeline: &str) -> Vec<String> {
  manifest
    .pipeline(pipeline)
    .map(|p| p.stages.iter().map(|s| s.kind.clone()).collect())
    .unwrap_or_default()
}

#[test]
fn minimal_image_end_to_end() {
  let mut image = image();
  let artifact = image.export();
  assert_eq!(artifact.pipeline, "image");
  assert_eq!(artifact.filename, "disk.img");

  let manifest = compile(image).unwrap();
  assert_eq!(
    stage_kinds(&manifest, "image"),
    vec![
      "org.osbuild.truncate",
      "org.osbuild.sfdisk",
      "org.osbuild.mkfs.ext4",
      "org.osbuild.bootc.install-to-filesystem",
      "org.osbuild.fstab",
    ]
  );

  let json = serde_json::to_value(&manifest).unwrap();
  assert_eq!(json["version"], "2");
  assert_eq!(json["pipelines"][0]["name"], "build");
  assert_eq!(json["pipelines"][1]["build"], "name:build");

  let stages = &json["pipelines"][1]["stages"];
  assert_eq!(stages[0]["options"]["size"], "10737418240");
  assert_eq!(stages[1]["options"]["partitions"][1]["start"], 501 * 2048);
  assert_eq!(stages[2]["devices"]["device"]["options"]["start"], 501 * 2048);
  assert_eq!(stages[3]["options"]["target-imgref"], IMAGE_REF);
  assert_eq!(stages[3]["mounts"][0]["partition"], 2);
  assert_eq!(stages[4]["mounts"].as_array().unwrap().len(), 3);

  assert!(manifest.sources.inline.is_none());
  assert_eq!(manifest.sources.skopeo.as_ref().unwrap().items.len(), 1);
}

#[test]
fn customizations_follow_deployment() {
  let mut image = image();
  image.customizations.groups = vec![Group::new("devs", Some(2000))];
  image.customizations.users = vec![User::new("root"), User::new("alice")];
  image.customizations.directories = vec![Directory::new("/etc/app").unwrap()];
  image.customizations.files = vec![File::new("/etc/app/config", "debug = false\n").unwrap()];
  image.customizations.selinux = "targeted".into();
  image.customizations.selinux_mode = "disabled".into();
  image.export();

  let manifest = compile(image).unwrap();
  let kinds = stage_kinds(&manifest, "image");
  assert_eq!(
    &kinds[5..],
    &[
      "org.osbuild.groups",
      "org.osbuild.mkdir",
      "org.osbuild.users",
      "org.osbuild.mkdir",
      "org.osbuild.copy",
      "org.osbuild.selinux",
      "org.osbuild.selinux.config",
    ]
  );

  let json = serde_json::to_value(&manifest).unwrap();
  let homedirs = &json["pipelines"][1]["stages"][6]["options"]["paths"];
  assert_eq!(homedirs[0]["path"], "/var/roothome");
  assert_eq!(homedirs[1]["path"], "/var/home");

  let inline = manifest.sources.inline.as_ref().unwrap();
  assert_eq!(inline.items.len(), 1);
}

#[test]
fn uefi_without_esp_is_rejected() {
  let mut image = RawBootcImage::new(
    "build",
    vec![SourceSpec::new(IMAGE_REF)],
    Platform::new(Arch::X86_64, BootMode::Uefi),
  );
  image.partition_table = Some(table());
  let err = compile(image).unwrap_err();
  assert!(matches!(err, ManifestError::MissingBootMounts { .. }));
}

#[test]
fn missing_partition_table_aborts() {
  let mut image = image();
  image.partition_table = None;
  let err = compile(image).unwrap_err();
  assert!(matches!(err, ManifestError::MissingPartitionTable { .. }));
  assert!(err.is_contract_violation());
}

#[test]
fn binding_protocol_errors() {
  let mut image = image();

  let err = image.unbind_inputs().unwrap_err();
  assert_eq!(err.to_string(), "no active binding for pipeline 'image'");

  image.bind_inputs(Inputs::new(vec![spec()])).unwrap();
  let err = image.bind_inputs(Inputs::new(vec![spec()])).unwrap_err();
  assert_eq!(err.to_string(), "binding already active for pipeline 'image'");
}

#[test]
fn serialization_is_deterministic() {
  let build = || {
    let mut image = image();
    image.customizations.users = vec![User::new("zed"), User::new("alice")];
    image.customizations.files = vec![
      File::new("/etc/b", "two").unwrap(),
      File::new("/etc/a", "one").unwrap(),
    ];
    image.export();
    compile(image).unwrap()
  };

  let first = serde_json::to_string(&build()).unwrap();
  let second = serde_json::to_string(&build()).unwrap();
  assert_eq!(first, second);
  assert_eq!(build().compute_hash().unwrap(), build().compute_hash().unwrap());
}

#[test]
fn qemu_projection_matches_table() {
  let opts = table().qemu_assembler_options();
  assert_eq!(opts.size, 10 * GIB);
  assert_eq!(opts.pttype, "gpt");
  assert!(opts.partitions[0].filesystem.is_none());
  assert_eq!(opts.partitions[1].filesystem.as_ref().unwrap().mountpoint, "/");
}
