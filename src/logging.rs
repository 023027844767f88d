//! Tracing subscriber setup for the `hab-test` binary.
//!
//! Tracing output is the operator's view of the run. The run log written by
//! [`CommandRunner`](crate::command::CommandRunner) is separate and holds only
//! the command audit trail plus child output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Returns the filter directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `debug`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(debug: bool) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}
