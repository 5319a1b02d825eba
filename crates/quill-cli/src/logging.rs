use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Pick the filter: an explicit flag, else `RUST_LOG`, else the config level.
pub fn env_filter(flag: Option<LevelFilter>, config_level: &str) -> EnvFilter {
    if let Some(level) = flag {
        return EnvFilter::new(level.to_string());
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Logs go to stderr so `quill eval` output
/// stays clean on stdout.
pub fn init(flag: Option<LevelFilter>, config_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(flag, config_level))
        .with_writer(std::io::stderr)
        .init();
}
