//! Tracing subscriber setup for binaries and front ends embedding the kernel.

use cityguide_types::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install a subscriber on stderr as described by `config`.
///
/// `RUST_LOG` overrides `config.level`. Returns `false` if a global
/// subscriber was already installed.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
