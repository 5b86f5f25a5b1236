//! Logging initialization.
//!
//! Log output goes to stderr; stdout stays clean since the JSON artifact path
//! and any subprocess plumbing own the primary streams.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// The filter honors `RUST_LOG` when set, otherwise defaults to debug-level
/// output for this crate in verbose mode and info-level output otherwise.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("tracestats=debug,info")
            } else {
                EnvFilter::try_new("tracestats=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(false);
        // A second initialization must not panic.
        init_tracing(true);
    }
}
