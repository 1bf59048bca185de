//! Process-wide diagnostic sink.
//!
//! Library code emits plain `tracing` events. The environment decides how
//! much of it reaches the sink: flow diagnostics in development, only
//! transport failures in production. `RUST_LOG` wins when set.

use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Filter directive used for an environment when `RUST_LOG` is unset.
pub fn default_directive(environment: Environment) -> &'static str {
    if environment.is_development() {
        "moso_core=debug,moso=debug"
    } else {
        "moso_core=error,moso=error"
    }
}

/// Build the filter for an environment.
pub fn env_filter(environment: Environment) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(environment)))
}

/// Install the global fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one keeps receiving events.
pub fn init(environment: Environment) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(environment))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_enables_debug() {
        assert!(default_directive(Environment::Development).contains("moso_core=debug"));
    }

    #[test]
    fn production_only_keeps_errors() {
        let directive = default_directive(Environment::Production);
        assert!(directive.contains("moso_core=error"));
        assert!(!directive.contains("debug"));
    }

    #[test]
    fn second_init_is_a_no_op() {
        init(Environment::Development);
        assert!(!init(Environment::Production));
    }
}
