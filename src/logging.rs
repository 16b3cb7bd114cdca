use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set. Safe to call once per process; subsequent
/// calls are ignored.
pub fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
