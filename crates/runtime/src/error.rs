//! Error types for process plumbing.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing bridge and display processes.
#[derive(Debug, Error)]
pub enum Error {
	/// The WebDriver bridge executable could not be located.
	#[error(
		"webdriver bridge not found. Install tauri-driver (cargo install tauri-driver) or set WV_BRIDGE_PATH"
	)]
	BridgeNotFound,

	/// A child process failed to spawn.
	#[error("failed to launch {what}: {source}")]
	Spawn {
		what: &'static str,
		#[source]
		source: std::io::Error,
	},

	/// The bridge process exited while we were still waiting for readiness.
	#[error("bridge exited during startup: {0}")]
	BridgeExited(String),

	/// Virtual display could not be started.
	#[error("virtual display unavailable: {0}")]
	Display(String),

	/// I/O error.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
