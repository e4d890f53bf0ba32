//! Test doubles and fixtures shared by unit and integration tests.
//!
//! Available to unit tests and, through the `test-utils` feature, to the integration tests
//! in `tests/`.
//!
//! - [`RecordingHost`] - a [`Host`](crate::host::Host) that records every call instead of
//!   touching users or systemd
//! - [`StaticReleaseSource`] - a [`ReleaseSource`](crate::github::ReleaseSource) serving
//!   in-memory releases
//! - [`PayloadBuilder`] - builds `.tar.xz` release payloads
//! - [`rooted_config`] - a [`GlobalConfig`](crate::config::GlobalConfig) with every host
//!   path under a temporary directory

pub mod doubles;
pub mod fixtures;

pub use doubles::{RecordingHost, StaticReleaseSource};
pub use fixtures::{PayloadBuilder, rooted_config};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging once per process.
///
/// With `Some(level)` that level is used; otherwise logging is only enabled when
/// `RUST_LOG` is set.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
