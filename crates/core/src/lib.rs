//! Crosspack Core - shared types and services
//!
//! This crate provides the pieces every other Crosspack crate leans on:
//! the error umbrella, user configuration, the output/progress sink,
//! release channels, project skeleton paths and the platform backend
//! registry.

pub mod channel;
pub mod config;
pub mod error;
pub mod output;
pub mod platform;
pub mod project;

pub use channel::{Channel, ChannelError};
pub use config::{AppConfig, Flavor, WordSize};
pub use error::{CrosspackError, Result};
pub use output::{FiniteProgress, InfiniteProgress, MemoryOutput, Output, SilentOutput, TerminalOutput};
pub use platform::{BackendContext, BackendFactory, BuildRequest, CreateRequest, PlatformBackend, PlatformRegistry};
pub use project::ProjectSkeleton;

/// Crosspack version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Crosspack";
