use std::time::Instant;

use tracing::trace;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. `MOSAIC_LOG` overrides the
/// default filter; falls back to `info` for the crate and `warn` elsewhere.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("MOSAIC_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,mosaic_wm=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Times a closure and emits the elapsed time at trace level. Used around
/// queries that sit on the per-frame drag path, where a stall is a bug.
pub fn trace_misc<T>(desc: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let end = Instant::now();
    trace!(time = ?(end - start), "{desc}");
    out
}
