//! Command flow through the demo backend

use std::sync::Arc;

use crosspack::commands::{BuildCommand, CheckCommand, CreateCommand, Session, UpdateCommand};
use crosspack::core::output::MessageKind;
use crosspack::core::{AppConfig, BuildRequest, CreateRequest, MemoryOutput};
use crosspack::platforms::default_registry;

fn session(output: Arc<MemoryOutput>) -> Session {
    Session::new(AppConfig::default(), output, default_registry())
}

#[tokio::test]
async fn test_create_update_build() {
    let dir = tempfile::tempdir().unwrap();
    let output = Arc::new(MemoryOutput::new());
    let session = session(output.clone());

    let root = CreateCommand {
        parent_dir: dir.path().to_path_buf(),
        package_id: "com.example.demo".to_string(),
        platforms: vec!["demo".to_string()],
        request: CreateRequest {
            version_spec: Some("beta".to_string()),
            ..CreateRequest::default()
        },
    }
    .execute(&session)
    .await
    .unwrap();

    let properties = root.join("prj/demo/demo.properties");
    assert!(std::fs::read_to_string(&properties).unwrap().contains("runtime=beta"));

    UpdateCommand {
        project_dir: root.clone(),
        version_spec: Some("canary".to_string()),
    }
    .execute(&session)
    .await
    .unwrap();
    assert!(std::fs::read_to_string(&properties).unwrap().contains("runtime=canary"));

    // Bump the app version the way a user would
    let manifest_path = root.join("app/manifest.json");
    let mut manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    manifest["crosswalk_app_version"] = serde_json::json!("1.2.3");
    std::fs::write(&manifest_path, manifest.to_string()).unwrap();

    // Building from a subdirectory finds the project root
    let packages = BuildCommand {
        project_dir: root.join("app"),
        request: BuildRequest {
            release: true,
            targets: vec!["arm".to_string()],
        },
    }
    .execute(&session)
    .await
    .unwrap();

    let names: Vec<String> = packages
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "com.example.demo-1.2.3-release.armeabi-v7a.txt",
            "com.example.demo-1.2.3-release.arm64-v8a.txt",
        ]
    );
    let arm64 = std::fs::read_to_string(&packages[1]).unwrap();
    assert!(arm64.contains("versionCode=30102003"));
    assert!(output.contains(MessageKind::Highlight, "Package: com.example.demo-1.2.3-release.arm64-v8a.txt"));
}

#[tokio::test]
async fn test_unknown_platform() {
    let dir = tempfile::tempdir().unwrap();
    let session = session(Arc::new(MemoryOutput::new()));

    let err = CreateCommand {
        parent_dir: dir.path().to_path_buf(),
        package_id: "com.example.demo".to_string(),
        platforms: vec!["ios".to_string()],
        request: CreateRequest::default(),
    }
    .execute(&session)
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Unknown platform 'ios'"));
    assert!(!dir.path().join("com.example.demo").exists());
}

#[tokio::test]
async fn test_build_outside_project() {
    let dir = tempfile::tempdir().unwrap();
    let session = session(Arc::new(MemoryOutput::new()));

    let result = BuildCommand {
        project_dir: dir.path().to_path_buf(),
        request: BuildRequest::default(),
    }
    .execute(&session)
    .await;
    assert!(result.is_err());
}

#[test]
fn test_check_lists_platforms() {
    let output = Arc::new(MemoryOutput::new());
    let report = CheckCommand.execute(&session(output.clone()));

    assert_eq!(report.platforms, vec!["android", "demo"]);
    assert!(output.contains(MessageKind::Info, "Platforms: android, demo"));
}
