#![allow(dead_code)]

pub use sitepipe_test_utils::builders;
pub use sitepipe_test_utils::fake_executor;
pub use sitepipe_test_utils::site;
pub use sitepipe_test_utils::{init_tracing, with_timeout};
