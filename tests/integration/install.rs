//! First installs.

use instllr::core::InstllrError;
use instllr::orchestrator::InstallStage;
use instllr::test_utils::{PayloadBuilder, StaticReleaseSource};

use crate::common::{ASSET, TestHost, options, simple_payload, source_with};

#[tokio::test]
async fn test_install_public_service() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0"]);

    let mut opts = options("1.0.0");
    opts.host = Some("svc.example.com".to_string());
    opts.port = Some(8080);
    opts.app_env = vec!["MODE=production".to_string()];

    let report = env.install(&source, &opts).await.unwrap();

    assert_eq!(report.service, "svc");
    assert_eq!(report.version, "1.0.0");
    assert!(report.previous_version.is_none());
    assert_eq!(report.install_dir, env.install_dir("svc", "1.0.0"));
    assert_eq!(report.units, vec!["svc"]);
    assert_eq!(report.warnings, 0);
    assert_eq!(report.log.completed().last(), Some(&InstallStage::ReloadAndActivate));

    let install_dir = env.install_dir("svc", "1.0.0");
    assert_eq!(std::fs::read_to_string(install_dir.join("VERSION")).unwrap(), "1.0.0");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(install_dir.join("app")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    let unit = env.unit("svc");
    assert!(unit.contains("ExecStart=app --serve\n"));
    assert!(unit.contains(&format!("WorkingDirectory={}\n", install_dir.display())));
    assert!(unit.contains("MODE=production"));
    assert!(unit.contains("PORT=8080"));

    let vhost = std::fs::read_to_string(env.config.vhost_path("svc.example.com")).unwrap();
    assert!(vhost.contains("server_name svc.example.com;"));
    assert!(vhost.contains("proxy_pass http://127.0.0.1:8080;"));
    assert_eq!(report.vhost, Some(env.config.vhost_path("svc.example.com")));

    let recorded = std::fs::read_to_string(env.config.ledger_dir.join("svc")).unwrap();
    assert_eq!(recorded.trim(), "1.0.0");

    let calls = env.host.calls();
    assert_eq!(calls.first().map(String::as_str), Some("stop svc"));
    assert!(calls.contains(&"useradd svc".to_string()));
    assert!(calls.ends_with(&[
        "daemon-reload".to_string(),
        "enable svc".to_string(),
        "start svc".to_string(),
        "restart nginx".to_string(),
    ]));
}

#[tokio::test]
async fn test_install_internal_service_with_workers() {
    let env = TestHost::new();
    let payload = PayloadBuilder::new(
        r#"{
            "run": "app --serve",
            "workers": [{ "name": "queue", "run": ["app", "--queue"] }]
        }"#,
    )
    .nested("svc-1.0.0")
    .build()
    .unwrap();
    let source = StaticReleaseSource::new().with_release("1.0.0", ASSET, payload);

    let report = env.install(&source, &options("")).await.unwrap();

    assert_eq!(report.units, vec!["svc", "queue-svc"]);
    assert!(report.vhost.is_none());
    assert!(env.install_dir("svc", "1.0.0").join("instllr.json").is_file());
    assert!(env.unit("queue-svc").contains("ExecStart=app --queue\n"));
    assert!(!env.unit("svc").contains("PORT="));
    assert!(!env.host.calls().contains(&"restart nginx".to_string()));
}

#[tokio::test]
async fn test_custom_service_name() {
    let env = TestHost::new();
    let source = source_with(&["2.0.0"]);
    let mut opts = options("2.0.0");
    opts.service_name = "svc-blue".to_string();

    let report = env.install(&source, &opts).await.unwrap();

    assert_eq!(report.install_dir, env.install_dir("svc-blue", "2.0.0"));
    assert!(env.config.unit_path("svc-blue").is_file());
}

#[tokio::test]
async fn test_install_steps_run_in_install_dir() {
    let env = TestHost::new();
    let payload = PayloadBuilder::new(
        r#"{ "run": ["app"], "install": [["sh", "-c", "pwd > installed-from"]] }"#,
    )
    .build()
    .unwrap();
    let source = StaticReleaseSource::new().with_release("1.0.0", ASSET, payload);

    env.install(&source, &options("1.0.0")).await.unwrap();

    let install_dir = env.install_dir("svc", "1.0.0");
    let pwd = std::fs::read_to_string(install_dir.join("installed-from")).unwrap();
    assert_eq!(
        std::fs::canonicalize(pwd.trim()).unwrap(),
        std::fs::canonicalize(&install_dir).unwrap()
    );
}

#[tokio::test]
async fn test_missing_release_fails_before_host_changes() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0"]);

    let err = env.install(&source, &options("9.9.9")).await.unwrap_err();

    assert!(err.to_string().starts_with("FetchRelease failed"));
    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::UnexpectedStatus { status: 404, .. })
    ));
    assert!(env.host.calls().is_empty());
    assert!(!env.config.services_root.exists());
}

#[tokio::test]
async fn test_missing_manifest_fails() {
    let env = TestHost::new();
    let payload = PayloadBuilder::without_manifest().file("README", "hello").build().unwrap();
    let source = StaticReleaseSource::new().with_release("1.0.0", ASSET, payload);

    let err = env.install(&source, &options("1.0.0")).await.unwrap_err();

    assert!(err.to_string().starts_with("LoadManifest failed"));
    assert!(env.host.calls().is_empty());
}

#[tokio::test]
async fn test_failing_install_step_aborts() {
    let env = TestHost::new();
    let payload = PayloadBuilder::new(r#"{ "run": ["app"], "install": [["false"]] }"#)
        .build()
        .unwrap();
    let source = StaticReleaseSource::new().with_release("1.0.0", ASSET, payload);

    let err = env.install(&source, &options("1.0.0")).await.unwrap_err();

    assert!(err.to_string().starts_with("StageAndRun failed"));
    assert!(!env.config.unit_path("svc").exists());
    assert!(!env.config.ledger_dir.join("svc").exists());
}

#[tokio::test]
async fn test_service_manager_failures_are_warnings() {
    let mut env = TestHost::new();
    env.host = instllr::test_utils::RecordingHost::failing_services();
    let source = StaticReleaseSource::new().with_release("1.0.0", ASSET, simple_payload("1.0.0"));

    let report = env.install(&source, &options("1.0.0")).await.unwrap();

    // stop, daemon-reload, enable, start
    assert_eq!(report.warnings, 4);
    assert!(env.config.unit_path("svc").is_file());
}

#[tokio::test]
async fn test_host_without_port_is_rejected() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0"]);
    let mut opts = options("1.0.0");
    opts.host = Some("svc.example.com".to_string());

    let err = env.install(&source, &opts).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<InstllrError>(), Some(InstllrError::ConfigError { .. })));
}
