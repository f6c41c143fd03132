//! Tracing subscriber setup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "bumpr=debug"
    } else {
        "bumpr=info"
    }
}

/// Initialize the tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `verbose` when set.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` holds an invalid filter or a global
/// subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::new(default_directive(verbose)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_verbosity() {
        assert_eq!(default_directive(false), "bumpr=info");
        assert_eq!(default_directive(true), "bumpr=debug");
    }
}
