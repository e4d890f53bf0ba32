//! Upgrades, reinstalls, downgrades and pruning.

use instllr::core::InstllrError;

use crate::common::{TestHost, options, source_with};

#[tokio::test]
async fn test_upgrade_replaces_and_prunes() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0", "1.1.0"]);

    env.install(&source, &options("1.0.0")).await.unwrap();
    env.host.clear();
    let report = env.install(&source, &options("1.1.0")).await.unwrap();

    assert_eq!(report.previous_version.as_deref(), Some("1.0.0"));
    assert_eq!(report.pruned, vec![env.install_dir("svc", "1.0.0")]);
    assert!(!env.install_dir("svc", "1.0.0").exists());
    assert!(env.install_dir("svc", "1.1.0").is_dir());

    let unit = env.unit("svc");
    assert!(unit.contains(&env.install_dir("svc", "1.1.0").display().to_string()));
    let recorded = std::fs::read_to_string(env.config.ledger_dir.join("svc")).unwrap();
    assert_eq!(recorded.trim(), "1.1.0");

    // The running unit is stopped before the new files are staged
    assert_eq!(env.host.calls().first().map(String::as_str), Some("stop svc"));
}

#[tokio::test]
async fn test_latest_upgrade() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0", "1.2.0"]);

    env.install(&source, &options("1.0.0")).await.unwrap();
    let report = env.install(&source, &options("")).await.unwrap();

    assert_eq!(report.version, "1.2.0");
}

#[tokio::test]
async fn test_same_version_is_rejected() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0"]);

    env.install(&source, &options("1.0.0")).await.unwrap();
    env.host.clear();
    let err = env.install(&source, &options("1.0.0")).await.unwrap_err();

    assert!(err.to_string().starts_with("CheckInstalledVersion failed"));
    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::AlreadyInstalled { .. })
    ));
    assert!(env.host.calls().is_empty());
}

#[tokio::test]
async fn test_downgrade_is_rejected() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0", "1.1.0"]);

    env.install(&source, &options("1.1.0")).await.unwrap();
    let err = env.install(&source, &options("1.0.0")).await.unwrap_err();

    match err.downcast_ref::<InstllrError>() {
        Some(InstllrError::DowngradeRejected {
            installed,
            requested,
            ..
        }) => {
            assert_eq!(installed, "1.1.0");
            assert_eq!(requested, "1.0.0");
        }
        other => panic!("Expected DowngradeRejected, got {other:?}"),
    }
    assert!(env.install_dir("svc", "1.1.0").is_dir());
    assert!(!env.install_dir("svc", "1.0.0").exists());
}

#[tokio::test]
async fn test_v_prefixed_tags_compare() {
    let env = TestHost::new();
    let source = source_with(&["v1.9.0", "v2.0.0"]);

    env.install(&source, &options("v1.9.0")).await.unwrap();
    let report = env.install(&source, &options("v2.0.0")).await.unwrap();

    assert_eq!(report.previous_version.as_deref(), Some("v1.9.0"));
    assert_eq!(report.pruned, vec![env.install_dir("svc", "v1.9.0")]);
}

#[tokio::test]
async fn test_multi_digit_segments_order_as_text() {
    let env = TestHost::new();
    let source = source_with(&["1.9.0", "1.10.0"]);

    env.install(&source, &options("1.9.0")).await.unwrap();
    let err = env.install(&source, &options("1.10.0")).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::DowngradeRejected { .. })
    ));
}

#[tokio::test]
async fn test_mismatched_version_shapes_fail() {
    let env = TestHost::new();
    let source = source_with(&["1.0", "1.1.0"]);

    env.install(&source, &options("1.0")).await.unwrap();
    let err = env.install(&source, &options("1.1.0")).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::VersionFormatMismatch { .. })
    ));
}

#[tokio::test]
async fn test_prune_keeps_newer_and_foreign_dirs() {
    let env = TestHost::new();
    let source = source_with(&["1.0.0", "1.1.0"]);
    let home = env.config.service_home("svc");
    for name in ["acme-svc-0.9.0", "acme-svc-2.0.0", "acme-svc-9.9", "data"] {
        std::fs::create_dir_all(home.join(name)).unwrap();
    }

    env.install(&source, &options("1.0.0")).await.unwrap();
    let report = env.install(&source, &options("1.1.0")).await.unwrap();

    assert_eq!(report.pruned, vec![home.join("acme-svc-1.0.0")]);
    assert!(home.join("acme-svc-2.0.0").is_dir());
    assert!(home.join("acme-svc-9.9").is_dir());
    assert!(home.join("data").is_dir());
}

#[tokio::test]
async fn test_tag_with_path_separator_is_rejected() {
    let env = TestHost::new();
    let source = source_with(&["release/1.0.0"]);

    let err = env.install(&source, &options("")).await.unwrap_err();

    assert!(err.to_string().starts_with("CheckInstalledVersion failed"));
    assert!(matches!(
        err.downcast_ref::<InstllrError>(),
        Some(InstllrError::InvalidReleaseTag { tag, .. }) if tag == "release/1.0.0"
    ));
    assert!(env.host.calls().is_empty());
    assert!(!env.config.services_root.exists());
    assert!(!env.config.ledger_dir.join("svc").exists());
}
