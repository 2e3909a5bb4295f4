//! Test utilities and fixtures for MCPM tests.
//!
//! Available to unit tests and, through the `test-utils` feature, to the integration
//! tests under `tests/`.
//!
//! - [`TestEnvironment`]: an isolated fake home directory with a config file, lockfile
//!   and vault under it
//! - [`fixtures`]: sample lockfile entries and a counting password prompt

pub mod environment;
pub mod fixtures;

pub use environment::TestEnvironment;
pub use fixtures::{CountingPrompt, LockfileFixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. With neither, logging stays off.
///
/// ```bash
/// RUST_LOG=mcpm_cli=debug cargo test
/// ```
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
