//! bootforge-lib: compiles bootable container disk images into osbuild manifests
//!
//! This crate provides the manifest compilation engine:
//! - `disk`: partition table model and its qemu assembler projection
//! - `pipeline`: pipelines turning resolved inputs into stages
//! - `manifest`: the pipeline dependency graph and manifest serialization
//! - `osbuild`: the executor's wire model (stages, devices, mounts, sources)
//! - `request`: declarative image requests tying everything together

pub mod artifact;
pub mod consts;
pub mod container;
pub mod customizations;
pub mod disk;
pub mod error;
pub mod manifest;
pub mod osbuild;
pub mod pipeline;
pub mod platform;
pub mod request;
pub mod util;
