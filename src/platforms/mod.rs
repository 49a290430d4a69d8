//! Platform backends and their registry

pub mod android;
pub mod demo;

use std::sync::Arc;

use crosspack_android_toolchain::{AndroidSdk, SdkError, SdkRunner};
use crosspack_build_engine::{AbiError, BuildLoopError, ToggleError};
use crosspack_core::{CrosspackError, PlatformRegistry};
use crosspack_manifest_manager::ManifestError;
use crosspack_runtime_dist::{CacheError, DownloadError, ImportError, ResolveError};

pub use android::AndroidPlatform;
pub use demo::DemoPlatform;

/// Registry with every backend, the Android one driving the SDK found on
/// the search path
pub fn default_registry() -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();
    registry.register(AndroidPlatform::ID, |ctx| {
        let sdk = AndroidSdk::locate(ctx.output.clone()).map_err(sdk_error)?;
        Ok(Box::new(AndroidPlatform::new(ctx, Arc::new(sdk))))
    });
    registry.register(DemoPlatform::ID, |ctx| Ok(Box::new(DemoPlatform::new(ctx))));
    registry
}

/// Registry whose Android backend uses `sdk`
pub fn registry_with_sdk(sdk: Arc<dyn SdkRunner>) -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();
    registry.register(AndroidPlatform::ID, move |ctx| {
        Ok(Box::new(AndroidPlatform::new(ctx, sdk.clone())))
    });
    registry.register(DemoPlatform::ID, |ctx| Ok(Box::new(DemoPlatform::new(ctx))));
    registry
}

pub(crate) fn sdk_error(e: SdkError) -> CrosspackError {
    match e {
        SdkError::Io(e) => CrosspackError::Io(e),
        other => CrosspackError::AndroidSdk(other.to_string()),
    }
}

pub(crate) fn resolve_error(e: ResolveError) -> CrosspackError {
    match e {
        ResolveError::NotAvailable(_) | ResolveError::NoVersions => {
            CrosspackError::VersionNotAvailable(e.to_string())
        }
        ResolveError::InvalidSpec(_) => CrosspackError::InvalidInput(e.to_string()),
        ResolveError::Fetch { .. } | ResolveError::MalformedIndex { .. } => {
            CrosspackError::Network(e.to_string())
        }
    }
}

pub(crate) fn download_error(e: DownloadError) -> CrosspackError {
    match e {
        DownloadError::InvalidProxy(_) => CrosspackError::Config(e.to_string()),
        other => CrosspackError::Network(other.to_string()),
    }
}

pub(crate) fn cache_error(e: CacheError) -> CrosspackError {
    match e {
        CacheError::Download(e) => CrosspackError::Download(e.to_string()),
        CacheError::Io(e) => CrosspackError::Io(e),
        other => CrosspackError::Internal(other.to_string()),
    }
}

pub(crate) fn import_error(e: ImportError) -> CrosspackError {
    CrosspackError::Import(e.to_string())
}

pub(crate) fn manifest_error(e: ManifestError) -> CrosspackError {
    match e {
        ManifestError::Io(e) => CrosspackError::Io(e),
        other => CrosspackError::Project(other.to_string()),
    }
}

pub(crate) fn abi_error(e: AbiError) -> CrosspackError {
    CrosspackError::InvalidInput(e.to_string())
}

pub(crate) fn toggle_error(e: ToggleError) -> CrosspackError {
    CrosspackError::Build(e.to_string())
}

pub(crate) fn build_loop_error(e: BuildLoopError) -> CrosspackError {
    CrosspackError::Build(e.to_string())
}
