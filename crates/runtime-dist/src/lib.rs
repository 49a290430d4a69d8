//! Crosspack Runtime Distribution
//!
//! Finding, downloading and importing runtime releases:
//! - Four part versions and channel index pages
//! - Channel search with fallback
//! - Download cache with atomic publishing
//! - Zip and unpacked release sources, importing into projects

pub mod archive;
pub mod cache;
pub mod downloader;
pub mod import;
pub mod index;
pub mod release;
pub mod resolver;
pub mod version;

pub use archive::{ArchiveError, ArchiveSource, Entry, EntryKind, ReleaseDir, ZipRelease};
pub use cache::{locate, ArtifactCache, CacheError, DownloadHandler};
pub use crosspack_core::Channel;
pub use downloader::{http_client, DownloadError, Downloader};
pub use import::{ArchiveImporter, ImportError, ImportOutcome, ImportPlan, MajorBounds};
pub use release::{ReleaseSource, RuntimePlatform};
pub use resolver::{Resolution, ResolveError, SearchState, VersionResolver, VersionSpec};
pub use version::{Version, VersionError};
