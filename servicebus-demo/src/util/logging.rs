//! Structured logging setup.

use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Output is
/// flattened JSON unless `LOG_FORMAT=text`, which selects the plain text
/// formatter for local runs.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if wants_json(env::var("LOG_FORMAT").ok().as_deref()) {
        registry.with(fmt::layer().json().flatten_event(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn wants_json(format: Option<&str>) -> bool {
    !matches!(
        format.map(|f| f.trim().to_ascii_lowercase()).as_deref(),
        Some("text") | Some("pretty")
    )
}
