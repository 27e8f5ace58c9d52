use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`warn`, `diarch=debug`, ...).
pub const LOG_ENV: &str = "DIARCH_LOG";

/// Install the stderr subscriber. `DIARCH_LOG` wins over `-v`.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
