use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,manim_studio=debug";

/// Console logging, filtered by `RUST_LOG` when set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
