use tracing_subscriber::EnvFilter;

use crate::config;

/// Install the tracing subscriber for a command line run.
///
/// Output goes to stderr so that stdout only carries the tool's results.
/// `RUST_LOG` takes precedence over the `LOG_LEVEL` setting.
pub fn init() {
    let settings = config::get_settings();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
