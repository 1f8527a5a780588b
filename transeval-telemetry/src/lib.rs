//! Process-wide logging setup (§6.5). One `EnvFilter`-backed `fmt` subscriber,
//! installed once.

use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Resolves the process-wide filter level. `RUST_LOG` wins when set, since it
/// supports full per-target directives; otherwise falls back to `LOG_LEVEL`
/// (`debug`/`info`/`warn`/`error`, §6.5), and then to `info` when neither is set.
fn resolve_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    match std::env::var("LOG_LEVEL") {
        Ok(level) if matches!(level.as_str(), "debug" | "info" | "warn" | "error") => EnvFilter::new(level),
        Ok(other) => {
            eprintln!("LOG_LEVEL={other:?} is not one of debug/info/warn/error, defaulting to info");
            EnvFilter::new("info")
        }
        Err(_) => EnvFilter::new("info"),
    }
}

/// Installs the global tracing subscriber. Safe to call more than once; only
/// the first call takes effect.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = resolve_filter();

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    });
}
