//! Manifest compilation.
//!
//! The [`ManifestBuilder`] owns the pipelines of an image, orders them by
//! their build dependencies and serializes them into the
//! [`Manifest`](crate::osbuild::Manifest) document consumed by the executor.

mod builder;

pub use builder::ManifestBuilder;
