//! Host executable resolution and environment checks during install.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use instllr::core::InstllrError;
use instllr::test_utils::{PayloadBuilder, StaticReleaseSource};

use crate::common::{ASSET, TestHost, options};

fn stub(dir: &Path, name: &str, version: &str) {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\necho {version}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn source(manifest: &str) -> StaticReleaseSource {
    let payload = PayloadBuilder::new(manifest).build().unwrap();
    StaticReleaseSource::new().with_release("1.0.0", ASSET, payload)
}

const RUNTIME_MANIFEST: &str = r#"{
    "require": [
        { "app": "instllr-rt", "version": ["instllr-rt", "--version"], "minVersion": "2.0.0" }
    ],
    "install": [["instllr-rt", "setup"]],
    "run": ["instllr-rt", "serve", "--port", "8080"],
    "workers": [{ "name": "cron", "run": ["instllr-rt", "cron"] }]
}"#;

#[tokio::test]
async fn test_dependencies_are_substituted_into_units() {
    let mut env = TestHost::new();
    let bin = env.root().join("opt/bin");
    stub(&bin, "instllr-rt", "v2.4.1");
    env.config.search_path = vec![bin.clone()];

    env.install(&source(RUNTIME_MANIFEST), &options("1.0.0")).await.unwrap();

    let runtime = bin.join("instllr-rt").display().to_string();
    assert!(env.unit("svc").contains(&format!("ExecStart={runtime} serve --port 8080\n")));
    assert!(env.unit("cron-svc").contains(&format!("ExecStart={runtime} cron\n")));
}

#[tokio::test]
async fn test_missing_dependency_fails_before_host_changes() {
    let env = TestHost::new();

    let err = env.install(&source(RUNTIME_MANIFEST), &options("1.0.0")).await.unwrap_err();

    assert!(err.to_string().starts_with("ResolveDeps failed"));
    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::DependencyNotFound { app }) if app == "instllr-rt"
    ));
    assert!(env.host.calls().is_empty());
}

#[tokio::test]
async fn test_old_dependency_is_rejected() {
    let mut env = TestHost::new();
    let bin = env.root().join("opt/bin");
    stub(&bin, "instllr-rt", "1.8.0");
    env.config.search_path = vec![bin];

    let err = env.install(&source(RUNTIME_MANIFEST), &options("1.0.0")).await.unwrap_err();

    match err.downcast_ref::<InstllrError>() {
        Some(InstllrError::DependencyNotMet {
            required,
            found,
            ..
        }) => {
            assert_eq!(required, "2.0.0");
            assert_eq!(found, "1.8.0");
        }
        other => panic!("Expected DependencyNotMet, got {other:?}"),
    }
}

#[tokio::test]
async fn test_required_env_must_be_supplied() {
    let env = TestHost::new();
    let manifest = r#"{ "run": ["app"], "env": { "require": ["DATABASE_URL"] } }"#;

    let err = env.install(&source(manifest), &options("1.0.0")).await.unwrap_err();
    assert!(err.to_string().starts_with("CheckEnv failed"));
    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::MissingEnvVar { name }) if name == "DATABASE_URL"
    ));

    let mut opts = options("1.0.0");
    opts.app_env = vec!["DATABASE_URL=postgres://localhost/svc".to_string()];
    env.install(&source(manifest), &opts).await.unwrap();
    assert!(env.unit("svc").contains("DATABASE_URL=postgres://localhost/svc"));
}
