//! Uninstall.

use instllr::orchestrator::{Installer, UninstallOptions};
use instllr::test_utils::{PayloadBuilder, StaticReleaseSource};

use crate::common::{ASSET, TestHost, locator, options};

#[tokio::test]
async fn test_uninstall_removes_units_vhost_and_record() {
    let env = TestHost::new();
    let payload = PayloadBuilder::new(
        r#"{ "run": ["app"], "workers": [{ "name": "queue", "run": ["app", "queue"] }] }"#,
    )
    .build()
    .unwrap();
    let source = StaticReleaseSource::new().with_release("1.0.0", ASSET, payload);

    let mut opts = options("1.0.0");
    opts.host = Some("svc.example.com".to_string());
    opts.port = Some(3000);
    env.install(&source, &opts).await.unwrap();
    env.host.clear();

    let mut uninstall = UninstallOptions::new(locator(""));
    uninstall.host = Some("svc.example.com".to_string());
    let report = Installer::new(&env.config, &source, &env.host)
        .uninstall(&uninstall)
        .await
        .unwrap();

    assert_eq!(report.removed_version.as_deref(), Some("1.0.0"));
    assert_eq!(report.units, vec!["svc", "queue-svc"]);
    assert_eq!(report.warnings, 0);
    assert!(!env.config.unit_path("svc").exists());
    assert!(!env.config.unit_path("queue-svc").exists());
    assert!(!env.config.vhost_path("svc.example.com").exists());
    assert!(!env.config.ledger_dir.join("svc").exists());
    assert!(env.install_dir("svc", "1.0.0").is_dir());

    assert_eq!(env.host.calls(), vec![
        "stop svc",
        "disable svc",
        "stop queue-svc",
        "disable queue-svc",
        "daemon-reload",
        "restart nginx",
    ]);
}

#[tokio::test]
async fn test_uninstall_unknown_service_is_best_effort() {
    let env = TestHost::new();
    let source = StaticReleaseSource::new();

    let report = Installer::new(&env.config, &source, &env.host)
        .uninstall(&UninstallOptions::new(locator("")))
        .await
        .unwrap();

    assert!(report.removed_version.is_none());
    assert_eq!(report.units, vec!["svc"]);
    assert!(!env.host.calls().contains(&"restart nginx".to_string()));
}

#[tokio::test]
async fn test_reinstall_after_uninstall() {
    let env = TestHost::new();
    let source = StaticReleaseSource::new().with_release(
        "1.0.0",
        ASSET,
        PayloadBuilder::new(r#"{ "run": ["app"] }"#).build().unwrap(),
    );

    env.install(&source, &options("1.0.0")).await.unwrap();
    Installer::new(&env.config, &source, &env.host)
        .uninstall(&UninstallOptions::new(locator("")))
        .await
        .unwrap();

    let report = env.install(&source, &options("1.0.0")).await.unwrap();
    assert!(report.previous_version.is_none());
    assert!(env.config.unit_path("svc").is_file());
}
