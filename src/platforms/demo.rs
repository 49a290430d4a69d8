//! Demo backend
//!
//! Needs no external tools. Packages are text files listing what a real
//! backend would have stamped into them, which makes it handy for trying
//! out the command line and for tests.

use std::path::PathBuf;

use async_trait::async_trait;
use crosspack_build_engine::{expand_targets, version_code, Abi};
use crosspack_core::{BackendContext, BuildRequest, CreateRequest, CrosspackError, PlatformBackend, Result};
use crosspack_manifest_manager::AppManifest;
use tracing::debug;

use super::{abi_error, manifest_error};

const PROJECT_FILE: &str = "demo.properties";

pub struct DemoPlatform {
    ctx: BackendContext,
}

impl DemoPlatform {
    pub const ID: &'static str = "demo";

    pub fn new(ctx: BackendContext) -> Self {
        Self { ctx }
    }

    fn platform_path(&self) -> PathBuf {
        self.ctx.skeleton.platform_path(Self::ID)
    }

    fn write_project_file(&self, version_spec: Option<&str>) -> Result<()> {
        let text = format!(
            "package={}\nruntime={}\n",
            self.ctx.skeleton.package_id(),
            version_spec.unwrap_or("none")
        );
        std::fs::write(self.platform_path().join(PROJECT_FILE), text)?;
        Ok(())
    }
}

#[async_trait]
impl PlatformBackend for DemoPlatform {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn generate(&mut self, request: &CreateRequest) -> Result<()> {
        let path = self.platform_path();
        std::fs::create_dir_all(&path)?;
        self.write_project_file(request.version_spec.as_deref())?;
        self.ctx
            .output
            .info(&format!("Project template created at {}", path.display()));
        Ok(())
    }

    async fn update(&mut self, version_spec: Option<&str>) -> Result<()> {
        if !self.platform_path().is_dir() {
            return Err(CrosspackError::NotFound(self.platform_path().display().to_string()));
        }
        self.write_project_file(version_spec)
    }

    async fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    async fn build(&mut self, request: &BuildRequest) -> Result<Vec<PathBuf>> {
        let manifest = AppManifest::load(self.ctx.skeleton.manifest_path())
            .await
            .map_err(manifest_error)?;
        let abis = if request.targets.is_empty() {
            Abi::all().to_vec()
        } else {
            expand_targets(&request.targets).map_err(abi_error)?
        };
        let kind = if request.release { "release" } else { "debug" };

        let mut packages = Vec::with_capacity(abis.len());
        for abi in abis {
            let code = version_code::generate(manifest.app_version(), abi.as_str())
                .map_err(|e| CrosspackError::Build(e.to_string()))?;
            let name = format!(
                "{}-{}-{}.{}.txt",
                self.ctx.skeleton.package_id(),
                manifest.app_version(),
                kind,
                abi
            );
            let package = self.platform_path().join(name);
            std::fs::write(&package, format!("abi={}\nversionCode={}\n", abi, code))?;
            debug!("Wrote {:?}", package);

            let exported = self.ctx.skeleton.export_package(&package)?;
            self.ctx.output.highlight(&format!(
                "Package: {}",
                exported.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
            ));
            packages.push(exported);
        }
        Ok(packages)
    }
}
