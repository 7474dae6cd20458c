use tracing_subscriber::EnvFilter;

/// Env var holding a `tracing` filter directive (e.g. `invoicer_core=debug`).
pub const LOG_ENV: &str = "INVOICER_LOG";

/// Install the stderr subscriber.
///
/// `--verbose` forces `debug`; otherwise `INVOICER_LOG` applies, defaulting
/// to `warn`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second install (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
