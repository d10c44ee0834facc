//! Error channel and tracing setup.
//!
//! Routing problems, duplicate registrations and strict-mode violations are
//! never thrown at the caller; they are handed to a [`Reporter`]. The default
//! reporter forwards them to `tracing`.

use tracing_subscriber::EnvFilter;

use crate::error::StoreError;

/// Sink for non-fatal store diagnostics.
pub trait Reporter: Send + Sync {
    fn report(&self, error: &StoreError);
}

/// Reporter that logs through `tracing` at warn/error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, error: &StoreError) {
        if error.is_warning() {
            tracing::warn!(target: "modstore", error = %error, "store warning");
        } else {
            tracing::error!(target: "modstore", error = %error, "store error");
        }
    }
}

/// Install a global fmt subscriber honoring `RUST_LOG` (default `info`).
///
/// The store never installs a subscriber itself; the embedding application
/// calls this once at startup.
///
/// ```
/// modstore::diagnostics::init_tracing();
/// tracing::info!(target: "modstore", "store host starting");
/// ```
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}
