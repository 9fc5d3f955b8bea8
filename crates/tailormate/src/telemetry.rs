//! Process-wide tracing setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber: `RUST_LOG` filtering (falling back to
/// `default_filter`) and plain or JSON output on stderr. `log` records from
/// dependencies and the database layer are forwarded into tracing.
///
/// Returns false when a subscriber was already installed; the existing one
/// stays in place.
pub fn init_tracing(default_filter: &str, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)));

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    // Another logger may already own the `log` facade.
    let _ = tracing_log::LogTracer::init();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        // The first call may lose to another test's subscriber; the second
        // can never win.
        let _ = init_tracing("info", false);
        assert!(!init_tracing("debug", true));
        tracing::info!("still logging");
    }
}
