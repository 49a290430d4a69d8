//! Platform Backends
//!
//! Every target platform implements [`PlatformBackend`]. Backends are
//! looked up by platform id in a [`PlatformRegistry`], which holds one
//! factory per id.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::{CrosspackError, Result};
use crate::output::Output;
use crate::project::ProjectSkeleton;

/// Options for project generation
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Channel name, version `a.b.c.d`, archive path or release directory
    pub version_spec: Option<String>,
    /// Requested ABIs, empty for the release default
    pub targets: Vec<String>,
    /// Use the lite runtime flavor
    pub lite: bool,
    /// Depend on a shared runtime installation
    pub shared: bool,
}

/// Options for a build
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub release: bool,
    /// Requested ABIs, empty for every ABI present in the project
    pub targets: Vec<String>,
}

/// Everything a backend needs, owned by the CLI entry point
#[derive(Clone)]
pub struct BackendContext {
    pub skeleton: ProjectSkeleton,
    pub config: AppConfig,
    pub output: Arc<dyn Output>,
}

/// A target platform
#[async_trait]
pub trait PlatformBackend: Send + Sync {
    /// Platform identifier, e.g. "android"
    fn id(&self) -> &'static str;

    /// Generate the platform project
    async fn generate(&mut self, request: &CreateRequest) -> Result<()>;

    /// Re-import the runtime into an existing project
    async fn update(&mut self, version_spec: Option<&str>) -> Result<()>;

    /// Re-apply application data to the platform project
    async fn refresh(&mut self) -> Result<()>;

    /// Build packages, returning their exported paths
    async fn build(&mut self, request: &BuildRequest) -> Result<Vec<PathBuf>>;
}

/// Constructor for a backend
pub type BackendFactory =
    Box<dyn Fn(BackendContext) -> Result<Box<dyn PlatformBackend>> + Send + Sync>;

/// Backends keyed by platform id
#[derive(Default)]
pub struct PlatformRegistry {
    factories: BTreeMap<&'static str, BackendFactory>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend factory, replacing any previous one for `id`
    pub fn register<F>(&mut self, id: &'static str, factory: F)
    where
        F: Fn(BackendContext) -> Result<Box<dyn PlatformBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(id, Box::new(factory));
    }

    /// Registered platform ids, sorted
    pub fn platform_ids(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Instantiate the backend for `id`
    pub fn instantiate(&self, id: &str, context: BackendContext) -> Result<Box<dyn PlatformBackend>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| CrosspackError::UnknownPlatform(id.to_string()))?;
        factory(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SilentOutput;

    struct NullBackend;

    #[async_trait]
    impl PlatformBackend for NullBackend {
        fn id(&self) -> &'static str {
            "null"
        }

        async fn generate(&mut self, _request: &CreateRequest) -> Result<()> {
            Ok(())
        }

        async fn update(&mut self, _version_spec: Option<&str>) -> Result<()> {
            Ok(())
        }

        async fn refresh(&mut self) -> Result<()> {
            Ok(())
        }

        async fn build(&mut self, _request: &BuildRequest) -> Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    fn context() -> BackendContext {
        BackendContext {
            skeleton: ProjectSkeleton::new("/tmp/com.example.foo", "com.example.foo"),
            config: AppConfig::default(),
            output: Arc::new(SilentOutput),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = PlatformRegistry::new();
        registry.register("null", |_ctx| Ok(Box::new(NullBackend)));

        assert_eq!(registry.platform_ids(), vec!["null"]);
        let backend = registry.instantiate("null", context()).unwrap();
        assert_eq!(backend.id(), "null");

        match registry.instantiate("ios", context()) {
            Err(CrosspackError::UnknownPlatform(id)) => assert_eq!(id, "ios"),
            _ => panic!("expected unknown platform"),
        }
    }
}
