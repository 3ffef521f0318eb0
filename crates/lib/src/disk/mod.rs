//! Disk layout model.
//!
//! [`PartitionTable`], [`Partition`] and [`Filesystem`] describe the on-disk
//! layout of an image. They carry no validation: overlapping partitions or a
//! layout exceeding the disk size are not detected here and surface only when
//! the executor partitions the image.
//!
//! # Submodules
//!
//! - [`assembler`] - Lossless projection to the qemu assembler description

pub mod assembler;
mod types;

pub use types::*;
