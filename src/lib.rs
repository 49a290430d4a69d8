//! Crosspack - package web apps with an embedded runtime
//!
//! Creates application projects, imports a runtime release into their
//! platform projects and builds one package per ABI.
//!
//! ## Architecture
//!
//! Crosspack is organized into specialized crates:
//!
//! - `crosspack-core`: configuration, errors, output sink, platform registry
//! - `crosspack-runtime-dist`: release lookup, download cache and import
//! - `crosspack-android-toolchain`: `android` and `ant` wrappers
//! - `crosspack-manifest-manager`: manifest.json, AndroidManifest.xml and
//!   project.properties editing
//! - `crosspack-build-engine`: ABI toggling, version codes and the build loop

#![warn(clippy::all)]

pub mod commands;
pub mod platforms;
pub mod project;

// Re-export main components for library usage
pub use crosspack_android_toolchain as toolchain;
pub use crosspack_build_engine as build;
pub use crosspack_core as core;
pub use crosspack_manifest_manager as manifest;
pub use crosspack_runtime_dist as runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::commands::{BuildCommand, CheckCommand, CreateCommand, Session, UpdateCommand};
    pub use crate::platforms::{default_registry, registry_with_sdk};
    pub use crate::project::{Project, ProjectManager};
    pub use crosspack_core::{AppConfig, BuildRequest, CreateRequest, Output};
}
