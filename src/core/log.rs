use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. `RUST_LOG` overrides the level filter.
///
/// Quiet runs log nothing for one-shot commands; a server keeps `info`.
pub fn init_logging(verbose: bool, server: bool) {
    let (level_filter, level) = match (verbose, server) {
        (true, _) => (LevelFilter::DEBUG, "debug"),
        (false, true) => (LevelFilter::INFO, "info"),
        (false, false) => (LevelFilter::OFF, "off"),
    };
    let app_filter = Targets::new().with_target("xrate", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .init();
}
