//! Log output setup for the `nvision` binary.
//!
//! Logs go to stderr so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, in `EnvFilter` syntax.
pub const LOG_ENV_VAR: &str = "NVISION_LOG";

/// Filter used when `NVISION_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Filter used when `NVISION_LOG` is unset and `--verbose` is given.
pub const VERBOSE_FILTER: &str = "debug";

/// Picks the filter directive: `NVISION_LOG` wins over `--verbose`.
pub fn filter_directive(env_value: Option<&str>, verbose: bool) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ if verbose => VERBOSE_FILTER.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directive = filter_directive(env_value.as_deref(), verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(None, false), "warn");
        assert_eq!(filter_directive(None, true), "debug");
        assert_eq!(filter_directive(Some("nvision_cli=info"), true), "nvision_cli=info");
        assert_eq!(filter_directive(Some("  "), false), "warn");
    }
}
