pub mod builders;
pub mod fake_executor;
pub mod site;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use sitepipe::logging::env_filter;

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a per-test capturing subscriber once per test binary.
///
/// Honours `SITEPIPE_LOG`, e.g. `SITEPIPE_LOG=sitepipe::engine=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(None))
            .with_test_writer()
            .try_init();
    });
}

pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step exceeded {TEST_TIMEOUT:?}"))
}
