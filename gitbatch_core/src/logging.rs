//! Tracing subscriber setup for the command line tools.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive, e.g. `gitbatch_core=debug`.
pub const LOG_ENV: &str = "GITBATCH_LOG";

/// Map a `-v` count to the default level used when [`LOG_ENV`] is unset.
#[must_use]
pub const fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install a stderr subscriber. Calling it twice leaves the first one active.
pub fn setup_logger(verbose: u8) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbosity_level(verbose).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let fmt = fmt::layer()
        .with_target(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if let Err(err) = tracing_subscriber::registry()
        .with(fmt)
        .with(env_filter)
        .try_init()
    {
        tracing::debug!(%err, "keeping the installed tracing subscriber");
    }
}
