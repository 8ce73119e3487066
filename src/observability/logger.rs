//! Log output setup
//!
//! Library code only emits `tracing` records. The binary installs one fmt
//! subscriber writing to stderr so that stdout stays reserved for the JSON
//! response protocol.

use std::fmt;
use std::io;

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info = 0,
    Warn = 1,
    /// Unrecoverable for the current pass
    Fatal = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds the filter: `RUST_LOG` wins, then `configured`, then the default.
pub fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global stderr subscriber.
///
/// Returns `false` if a subscriber was already installed, which happens when
/// several commands run in one process.
pub fn init_logging(configured: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Fatal);
        assert_eq!(Severity::Fatal.to_string(), "FATAL");
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        // Must not panic on a malformed directive
        let _ = build_filter(Some("=[not a filter"));
    }

    #[test]
    fn test_second_init_is_rejected() {
        init_logging(Some("warn"));
        assert!(!init_logging(Some("warn")));
    }
}
