//! Android backend
//!
//! Generates an `ant` project with the Android SDK, imports a runtime
//! release into it and builds one APK per ABI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use crosspack_android_toolchain::{java_package_dir, scrape_tag, SdkRunner, MIN_API_LEVEL};
use crosspack_build_engine::version_code;
use crosspack_build_engine::{common_word_size, expand_targets, AbiBuildLoop, BuildTool, NativeLibs, ToolError};
use crosspack_core::{
    BackendContext, BuildRequest, CreateRequest, CrosspackError, Flavor, Output, PlatformBackend, Result,
    WordSize,
};
use crosspack_manifest_manager::{AndroidManifestFile, AppManifest, ProjectProperties};
use crosspack_runtime_dist::{
    http_client, ArchiveImporter, ArtifactCache, ImportOutcome, ImportPlan, MajorBounds, ReleaseSource,
    RuntimePlatform, Version, VersionResolver, VersionSpec,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{
    abi_error, build_loop_error, cache_error, download_error, import_error, manifest_error, resolve_error,
    sdk_error, toggle_error,
};

const CORE_LIBRARY: &str = "xwalk_core_library";
const SHARED_LIBRARY: &str = "xwalk_shared_library";

/// Without `_*`, so underscore prefixed assets get packaged
const AAPT_IGNORE_ASSETS: &str =
    "aapt.ignore.assets = \"!.svn:!.git:.*:!CVS:!thumbs.db:!picasa.ini:!*.scc:*~\"\n";

const TEMPLATE_PACKAGE: &str = "org.xwalk.app.template";
const TEMPLATE_CLASS: &str = "AppTemplateActivity";
const TEMPLATE_URL_LOAD: &str = r#"loadAppFromUrl("file:///android_asset/www/index.html")"#;

const SIGNING_DOCS: &str =
    "https://developer.android.com/tools/publishing/app-signing.html#signing-manually";

const BOUNDS: MajorBounds = MajorBounds {
    min_supported: 9,
    min_current: 17,
    max_tested: 19,
};

/// `FooActivity` for package `com.example.foo`
pub fn activity_class_name(package_id: &str) -> String {
    let last = package_id.rsplit('.').next().unwrap_or(package_id);
    let mut chars = last.chars();
    let mut name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    name.push_str("Activity");
    name
}

/// Turn the release's template activity into the app's activity
pub fn rewrite_activity(template: &str, package_id: &str, class_name: &str) -> String {
    template
        .replacen(TEMPLATE_PACKAGE, package_id, 1)
        .replacen(TEMPLATE_CLASS, class_name, 1)
        .replacen(
            TEMPLATE_URL_LOAD,
            &format!(r#"loadAppFromManifest("app://{}/manifest.json")"#, package_id),
            1,
        )
}

/// Entries a release must provide, and where they go in `project`
pub fn import_plan(project: &Path, package_id: &str, library: &str) -> ImportPlan {
    let class_name = activity_class_name(package_id);
    let activity = java_package_dir(project, package_id).join(format!("{}.java", class_name));
    let package = package_id.to_string();

    ImportPlan::new(BOUNDS)
        .extract(format!("{}/", library), project.join(library))
        .extract("template/libs/xwalk_app_runtime_java.jar", project.join("libs"))
        .rewrite(
            "template/src/org/xwalk/app/template/AppTemplateActivity.java",
            activity,
            move |text| rewrite_activity(text, &package, &class_name),
        )
        .extract("template/res/", project.join("res"))
}

/// Android platform backend
pub struct AndroidPlatform {
    ctx: BackendContext,
    sdk: Arc<dyn SdkRunner>,
}

impl AndroidPlatform {
    pub const ID: &'static str = "android";

    pub fn new(ctx: BackendContext, sdk: Arc<dyn SdkRunner>) -> Self {
        Self { ctx, sdk }
    }

    fn output(&self) -> &dyn Output {
        self.ctx.output.as_ref()
    }

    fn platform_path(&self) -> PathBuf {
        self.ctx.skeleton.platform_path(Self::ID)
    }

    fn package_id(&self) -> &str {
        self.ctx.skeleton.package_id()
    }

    /// Where downloaded releases are kept, next to the project
    fn download_dir(&self) -> PathBuf {
        let root = self.ctx.skeleton.root();
        root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf())
    }

    fn is_shared(&self) -> bool {
        self.platform_path().join(SHARED_LIBRARY).is_dir()
    }

    async fn append_log(&self, name: &str, text: &str) -> Result<()> {
        let dir = self.ctx.skeleton.log_path();
        tokio::fs::create_dir_all(&dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(name))
            .await?;
        file.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn query_api_target(&self) -> Result<String> {
        let api_target = self.sdk.query_target(MIN_API_LEVEL).await.map_err(sdk_error)?;
        self.output()
            .info(&format!("Building against API level {}", api_target));
        Ok(api_target)
    }

    /// Version specifier used when the user gives none
    fn default_spec(&self, flavor: Flavor) -> String {
        let channel = match flavor {
            Flavor::CrosswalkLite => flavor.default_channel(),
            Flavor::Crosswalk => {
                let channel = self.ctx.config.default_channel;
                self.output()
                    .info(&format!("Defaulting to download channel {}", channel));
                channel
            }
        };
        channel.to_string()
    }

    /// Archive for `spec`, downloading it unless it is a local path
    async fn locate_release(&self, spec: &str, source: ReleaseSource) -> Result<PathBuf> {
        let (target, channel) = match VersionSpec::parse(spec).map_err(resolve_error)? {
            VersionSpec::Path(path) => {
                self.output().info(&format!("Using {}", path.display()));
                return Ok(path);
            }
            VersionSpec::Channel(channel) => (None, Some(channel)),
            VersionSpec::Version(version) => (Some(version), None),
        };

        let client = http_client(&self.ctx.config).map_err(download_error)?;
        let resolver = VersionResolver::new(client.clone(), source.clone(), self.ctx.output.clone());
        let (version, channel) = resolver
            .resolve(target.as_ref(), channel)
            .await
            .and_then(|resolution| resolution.into_found())
            .map_err(resolve_error)?;
        self.output()
            .info(&format!("Found version '{}' in channel '{}'", version, channel));

        let cache = ArtifactCache::new(
            client,
            source,
            self.ctx.config.cache_dir.clone(),
            self.ctx.output.clone(),
        );
        cache
            .fetch(&version, channel, &self.download_dir())
            .await
            .map_err(cache_error)
    }

    /// Import the release for `spec` and link the library project
    async fn import_runtime(
        &self,
        spec: &str,
        source: ReleaseSource,
        library: &str,
        api_target: &str,
    ) -> Result<Version> {
        let release = self.locate_release(spec, source).await?;
        let project = self.platform_path();
        let plan = import_plan(&project, self.package_id(), library);

        let importer = ArchiveImporter::new(self.ctx.output.clone());
        let version = match importer.import_path(&release, &plan).map_err(import_error)? {
            ImportOutcome::Imported(version) => version,
            ImportOutcome::Unsupported { reason, .. } => return Err(CrosspackError::Import(reason)),
        };

        ProjectProperties::open(project.join("project.properties"))
            .and_then(|props| props.set_library_reference(library))
            .map_err(manifest_error)?;

        let library_props = project.join(library).join("project.properties");
        if library_props.is_file() {
            ProjectProperties::open(&library_props)
                .and_then(|props| props.set_target(api_target))
                .map_err(manifest_error)?;
        } else {
            self.output()
                .warning(&format!("File not found: {}", library_props.display()));
        }

        Ok(version)
    }

    async fn load_manifest(&self) -> Result<AppManifest> {
        AppManifest::load(self.ctx.skeleton.manifest_path())
            .await
            .map_err(manifest_error)
    }

    /// Copy the web app into the project's assets
    fn copy_app(&self) -> Result<()> {
        let app = self.ctx.skeleton.app_path();
        let www = self.platform_path().join("assets").join("www");
        std::fs::create_dir_all(&www)?;

        for entry in WalkDir::new(&app).min_depth(1) {
            let entry = entry.map_err(|e| CrosspackError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(&app)
                .map_err(|e| CrosspackError::Internal(e.to_string()))?;
            let target = www.join(relative);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target)?;
            } else {
                std::fs::copy(entry.path(), &target)?;
            }
        }
        debug!("Copied {:?} to {:?}", app, www);
        Ok(())
    }
}

#[async_trait]
impl PlatformBackend for AndroidPlatform {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn generate(&mut self, request: &CreateRequest) -> Result<()> {
        if request.lite && request.shared {
            return Err(CrosspackError::InvalidInput(
                "Options \"lite\" and \"shared\" can not be used together".into(),
            ));
        }

        // One create only handles ABIs of the same word size
        let abis = expand_targets(&request.targets).map_err(abi_error)?;
        let word_size = common_word_size(&abis).map_err(abi_error)?;

        let api_target = self.query_api_target().await?;

        let path = self.platform_path();
        let log = self
            .sdk
            .generate_project_skeleton(&path, self.package_id(), &api_target)
            .await
            .map_err(sdk_error)?;
        self.append_log("create.log", &log).await?;

        let mut ant_properties = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.join("ant.properties"))
            .await?;
        ant_properties.write_all(AAPT_IGNORE_ASSETS.as_bytes()).await?;

        let flavor = if request.lite {
            Flavor::CrosswalkLite
        } else {
            self.ctx.config.flavor
        };
        let mut source = ReleaseSource::from_config(&self.ctx.config, RuntimePlatform::Android).with_flavor(flavor);
        if let Some(word_size) = word_size.and_then(WordSize::from_bits) {
            source = source.with_word_size(word_size);
        }

        let spec = match &request.version_spec {
            Some(spec) => spec.clone(),
            None => self.default_spec(flavor),
        };
        let library = if request.shared { SHARED_LIBRARY } else { CORE_LIBRARY };

        let version = self
            .import_runtime(&spec, source, library, &api_target)
            .await
            .map_err(|e| {
                self.output().error(&e.user_message());
                CrosspackError::Project(format!("Creating project template failed: {}", e))
            })?;

        info!("Imported Crosswalk {} into {:?}", version, path);
        self.output()
            .info(&format!("Project template created at {}", path.display()));
        Ok(())
    }

    async fn update(&mut self, version_spec: Option<&str>) -> Result<()> {
        let api_target = self.query_api_target().await?;
        let library = if self.is_shared() { SHARED_LIBRARY } else { CORE_LIBRARY };
        let source = ReleaseSource::from_config(&self.ctx.config, RuntimePlatform::Android);

        let spec = match version_spec {
            Some(spec) => spec.to_string(),
            None => self.default_spec(self.ctx.config.flavor),
        };
        let version = self.import_runtime(&spec, source, library, &api_target).await?;
        self.output()
            .info(&format!("Updated to Crosswalk {}", version));
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        let manifest = self.load_manifest().await?;
        self.copy_app()?;

        let android_manifest = AndroidManifestFile::new(self.platform_path().join("AndroidManifest.xml"));
        if android_manifest.path().is_file() {
            android_manifest
                .set_version_name(manifest.app_version())
                .await
                .map_err(manifest_error)?;
        }
        Ok(())
    }

    async fn build(&mut self, request: &BuildRequest) -> Result<Vec<PathBuf>> {
        let manifest = self.load_manifest().await?;
        let project = self.platform_path();

        let libs = if self.is_shared() {
            NativeLibs::shared()
        } else {
            NativeLibs::embedded(&project)
        };
        let abis = libs.select(&request.targets, self.output()).map_err(toggle_error)?;
        if abis.is_empty() {
            return Err(CrosspackError::Build("Failed to determine which ABIs to build".into()));
        }

        self.refresh().await?;

        let tool = AntBuild {
            sdk: self.sdk.clone(),
            app_version: manifest.app_version().to_string(),
            output: self.ctx.output.clone(),
        };
        let abi_loop = AbiBuildLoop::new(
            &project,
            libs,
            self.ctx.skeleton.log_path(),
            manifest.app_version(),
            request.release,
            self.ctx.output.clone(),
        );
        let packages = abi_loop.run(&abis, &tool).await.map_err(build_loop_error)?;

        let mut exported = Vec::with_capacity(packages.len());
        for package in packages {
            let path = self.ctx.skeleton.export_package(&package)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.output().highlight(&format!("Package: {}", name));
            exported.push(path);
        }

        if request.release {
            self.output()
                .highlight("APKs need to be signed before publishing, see");
            self.output().highlight(SIGNING_DOCS);
        }
        Ok(exported)
    }
}

/// `ant` through the SDK runner, stamping a version code per ABI
struct AntBuild {
    sdk: Arc<dyn SdkRunner>,
    app_version: String,
    output: Arc<dyn Output>,
}

#[async_trait]
impl BuildTool for AntBuild {
    async fn prepare_abi(&self, project: &Path, abi: &str) -> std::result::Result<(), ToolError> {
        let code = version_code::generate(&self.app_version, abi)?;
        self.output
            .info(&format!("Using android:versionCode '{}'", code));
        AndroidManifestFile::new(project.join("AndroidManifest.xml"))
            .set_version_code(&code)
            .await?;
        Ok(())
    }

    async fn build(
        &self,
        project: &Path,
        release: bool,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> std::result::Result<bool, ToolError> {
        Ok(self.sdk.run_build(project, release, on_line).await?)
    }

    fn progress_tag<'a>(&self, line: &'a str) -> Option<&'a str> {
        scrape_tag(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_class_name() {
        assert_eq!(activity_class_name("com.example.foo"), "FooActivity");
        assert_eq!(activity_class_name("org.bar_baz"), "Bar_bazActivity");
    }

    #[test]
    fn test_rewrite_activity() {
        let template = r#"package org.xwalk.app.template;

public class AppTemplateActivity extends XWalkRuntimeActivityBase {
    @Override
    protected void didTryLoadRuntimeView(View runtimeView) {
        getRuntimeView().loadAppFromUrl("file:///android_asset/www/index.html");
    }
}
"#;
        let activity = rewrite_activity(template, "com.example.foo", "FooActivity");
        assert!(activity.starts_with("package com.example.foo;"));
        assert!(activity.contains("public class FooActivity extends"));
        assert!(activity.contains(r#"loadAppFromManifest("app://com.example.foo/manifest.json")"#));
        assert!(!activity.contains("index.html"));
    }

    #[test]
    fn test_import_plan_entries() {
        let plan = import_plan(Path::new("/prj/android"), "com.example.foo", CORE_LIBRARY);
        let names: Vec<&str> = plan.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "xwalk_core_library/",
                "template/libs/xwalk_app_runtime_java.jar",
                "template/src/org/xwalk/app/template/AppTemplateActivity.java",
                "template/res/",
            ]
        );
        assert_eq!(plan.bounds.min_current, 17);
    }
}
