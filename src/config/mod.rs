//! Configuration loading.

pub mod manifest;

pub use manifest::{Manifest, Overrides, MANIFEST_FILE};
