//! Log output for binaries built on Warden.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable. The `warden`
/// target prefix covers every `warden_*` crate.
pub const DEFAULT_FILTER: &str = "warden=info";

/// Installs a `fmt` subscriber on stderr filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already set, so it is safe to
/// call from tests and from several entry points.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();

    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
