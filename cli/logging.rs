use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Events go to stderr, filtered by `RUST_LOG` with a default of `info`.
pub fn init() {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let fmt_layer = fmt::layer().with_writer(std::io::stderr);
	// Ignore the error from a subscriber that is already installed.
	let _ = tracing_subscriber::registry()
		.with(env_filter)
		.with(fmt_layer)
		.try_init();
}
