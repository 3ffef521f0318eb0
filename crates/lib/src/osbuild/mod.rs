//! Wire model of the osbuild executor.
//!
//! Types here serialize to exactly the JSON the executor expects: stage types,
//! option names and device/mount layouts are fixed by the executor, not by this
//! crate. Stage constructors live next to the option types they fill.
//!
//! # Submodules
//!
//! - [`bootc`] - Container inputs, bootc install and container deploy stages
//! - [`devices`] - Loopback devices
//! - [`disk`] - Image creation: truncate, sfdisk, mkfs
//! - [`fsnode`] - Custom directories and files: mkdir, copy, chmod, chown
//! - [`fstab`] - Filesystem configuration: fstab or systemd mount units
//! - [`manifest`] - Pipelines, sources and the manifest document
//! - [`mounts`] - Mounts and the device/mount context propagator
//! - [`oscap`] - OpenSCAP remediation
//! - [`selinux`] - SELinux labeling and configuration
//! - [`stage`] - The stage envelope
//! - [`users`] - Users, groups and home directories

pub mod bootc;
pub mod devices;
pub mod disk;
pub mod fsnode;
pub mod fstab;
pub mod manifest;
pub mod mounts;
pub mod oscap;
pub mod selinux;
pub mod stage;
pub mod users;

pub use devices::{Device, LoopbackDeviceOptions};
pub use manifest::{Manifest, Pipeline, Sources};
pub use mounts::{DeviceMountContext, Mount, gen_bootupd_devices_mounts};
pub use stage::{Stage, StageInputs, StageOptions};
