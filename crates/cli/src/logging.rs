//! Logging setup for the wv binary.
//!
//! Everything goes to stderr: stdout is reserved for command output and the
//! server's machine-readable ready line.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	// 0 = errors only (and mute webdriver transport noise entirely)
	// 1 (-v) = info for wv, warn for the transport
	// 2+ (-vv) = debug for everything
	let filter = match verbosity {
		0 => "error,fantoccini=off,hyper=off,hyper_util=off",
		1 => "info,fantoccini=warn,hyper=warn,hyper_util=warn",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
