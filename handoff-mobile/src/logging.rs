//! Optional log output for hosts that do not install their own subscriber.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a formatting subscriber filtered by `filter` (`RUST_LOG` syntax).
///
/// Only the first call has an effect. An unparsable filter falls back to
/// `info`.
#[uniffi::export]
pub fn init_logging(filter: String) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}
