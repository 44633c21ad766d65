//! Deposit form with a 15-year savings projection: the calculator core, the
//! session state behind the form, and the HTTP surface that serves it.

pub mod api;
pub mod config;
pub mod core;
pub mod errors;
pub mod session;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber; `RUST_LOG` overrides the default.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("deposit_form=info"));

        if fmt().with_env_filter(filter).try_init().is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    });
}
