// src/logging.rs
use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Diagnostics go to stderr so stdout carries only status lines.
/// Filter via `RUST_LOG` (default `warn`); `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let registry = tracing_subscriber::registry().with(filter);
        let res = if json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        };
        if res.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    });
}
