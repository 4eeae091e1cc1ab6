//! Logging setup: `RUST_LOG` wins, otherwise `pq=info` (`pq=warn` with `--quiet`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(quiet: bool) {
    let default = if quiet { "pq=warn" } else { "pq=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout is reserved for rendered tables.
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false);

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();
}
