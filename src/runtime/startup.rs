use tracing_subscriber::EnvFilter;

use jukebot::config;

/// Install the fmt subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init_logging(settings: &config::Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
