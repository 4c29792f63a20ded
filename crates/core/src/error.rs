//! Error taxonomy for session and command operations.
//!
//! Preconditions ([`Error::NotConnected`]) and element-state failures surface
//! immediately and are never retried; timeouts carry elapsed time for
//! diagnosability. Screenshot strategy failures are accumulated by the
//! handler and only become [`Error::Screenshot`] once every applicable
//! strategy is exhausted.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// No active session; connect first.
	#[error("not connected: no active session (connect with an application path first)")]
	NotConnected,

	#[error("element not found: {selector}")]
	ElementNotFound { selector: String },

	#[error("element not visible: {selector}")]
	ElementNotVisible { selector: String },

	#[error("click rejected for {selector}: {reason}")]
	ClickRejected { selector: String, reason: String },

	/// A wait ran out of time; `elapsed_ms` is the observed wall time.
	#[error("timeout after {elapsed_ms}ms waiting for {condition}")]
	Timeout { elapsed_ms: u64, condition: String },

	#[error("javascript evaluation failed: {0}")]
	Eval(String),

	/// Every applicable capture strategy failed; the message concatenates the
	/// per-strategy errors in the order they were attempted.
	#[error("screenshot failed, all strategies exhausted: {0}")]
	Screenshot(String),

	#[error("webdriver session error: {0}")]
	WebDriver(String),

	#[error(transparent)]
	Runtime(#[from] wv_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl From<fantoccini::error::CmdError> for Error {
	fn from(err: fantoccini::error::CmdError) -> Self {
		Error::WebDriver(err.to_string())
	}
}

impl From<fantoccini::error::NewSessionError> for Error {
	fn from(err: fantoccini::error::NewSessionError) -> Self {
		Error::WebDriver(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn not_connected_message_names_the_fix() {
		assert!(Error::NotConnected.to_string().contains("not connected"));
	}

	#[test]
	fn element_not_found_includes_selector() {
		let err = Error::ElementNotFound {
			selector: "#missing-xyz".into(),
		};
		assert!(err.to_string().contains("not found"));
		assert!(err.to_string().contains("#missing-xyz"));
	}

	#[test]
	fn timeout_reports_elapsed() {
		let err = Error::Timeout {
			elapsed_ms: 5021,
			condition: "element: .spinner".into(),
		};
		assert!(err.to_string().contains("5021ms"));
	}
}
