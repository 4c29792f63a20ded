//! The command envelope accepted by every front-end.
//!
//! A [`Command`] arrives as JSON with a `cmd` discriminator:
//!
//! ```json
//! {"cmd": "click", "selector": "#submit", "autoWait": false}
//! ```
//!
//! The enum is closed: adding a command is a compile-time exercise, and an
//! unknown `cmd` or a missing required field fails deserialization before any
//! session state is touched.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single operation against the connected application.
///
/// Field names are camelCase on the wire, with snake_case accepted as an
/// alias for hand-written payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Command {
	/// Click an element after it becomes interactive.
	#[serde(rename_all = "camelCase")]
	Click {
		selector: String,
		#[serde(default, alias = "auto_wait")]
		auto_wait: Option<bool>,
	},

	/// Set the value of an input-like element.
	#[serde(rename_all = "camelCase")]
	Type {
		selector: String,
		text: String,
		#[serde(default, alias = "auto_wait")]
		auto_wait: Option<bool>,
	},

	/// Wait for an element to appear, or to go away when `gone` is set.
	#[serde(rename_all = "camelCase")]
	Wait {
		selector: String,
		/// Deadline in milliseconds.
		#[serde(default)]
		timeout: Option<u64>,
		#[serde(default)]
		gone: Option<bool>,
	},

	/// Evaluate JavaScript in the application context.
	Eval { script: String },

	/// Capture the rendered window through the strategy chain.
	#[serde(rename_all = "camelCase")]
	Screenshot {
		#[serde(default)]
		output: Option<PathBuf>,
		#[serde(default, alias = "full_page")]
		full_page: Option<bool>,
		#[serde(default, alias = "auto_wait")]
		auto_wait: Option<bool>,
	},

	/// Produce an accessibility-tree listing of the live DOM.
	#[serde(rename_all = "camelCase")]
	Snapshot {
		#[serde(default)]
		output: Option<PathBuf>,
		#[serde(default, alias = "auto_wait")]
		auto_wait: Option<bool>,
	},

	/// Fixed delay.
	Sleep { ms: u64 },

	/// Report connection state. Never requires an active session.
	Status,
}

impl Command {
	/// Wire name of the command, for logging and result envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Command::Click { .. } => "click",
			Command::Type { .. } => "type",
			Command::Wait { .. } => "wait",
			Command::Eval { .. } => "eval",
			Command::Screenshot { .. } => "screenshot",
			Command::Snapshot { .. } => "snapshot",
			Command::Sleep { .. } => "sleep",
			Command::Status => "status",
		}
	}

	/// Per-command autoWait override, if the variant carries one.
	pub fn auto_wait(&self) -> Option<bool> {
		match self {
			Command::Click { auto_wait, .. }
			| Command::Type { auto_wait, .. }
			| Command::Screenshot { auto_wait, .. }
			| Command::Snapshot { auto_wait, .. } => *auto_wait,
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn click_deserializes_from_wire_json() {
		let cmd: Command = serde_json::from_str(r##"{"cmd":"click","selector":"#submit"}"##).unwrap();
		assert_eq!(
			cmd,
			Command::Click {
				selector: "#submit".into(),
				auto_wait: None,
			}
		);
		assert_eq!(cmd.name(), "click");
	}

	#[test]
	fn auto_wait_accepts_camel_and_snake_case() {
		let camel: Command =
			serde_json::from_str(r#"{"cmd":"click","selector":"a","autoWait":false}"#).unwrap();
		let snake: Command =
			serde_json::from_str(r#"{"cmd":"click","selector":"a","auto_wait":false}"#).unwrap();
		assert_eq!(camel.auto_wait(), Some(false));
		assert_eq!(camel, snake);
	}

	#[test]
	fn click_without_selector_is_rejected() {
		let err = serde_json::from_str::<Command>(r#"{"cmd":"click"}"#).unwrap_err();
		assert!(err.to_string().contains("selector"));
	}

	#[test]
	fn unknown_cmd_is_rejected() {
		assert!(serde_json::from_str::<Command>(r#"{"cmd":"explode"}"#).is_err());
	}

	#[test]
	fn eval_round_trips() {
		let cmd = Command::Eval {
			script: "return document.title".into(),
		};
		let json = serde_json::to_string(&cmd).unwrap();
		assert_eq!(json, r#"{"cmd":"eval","script":"return document.title"}"#);
		assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), cmd);
	}

	#[test]
	fn wait_carries_timeout_and_gone() {
		let cmd: Command =
			serde_json::from_str(r#"{"cmd":"wait","selector":".spinner","timeout":3000,"gone":true}"#)
				.unwrap();
		assert_eq!(
			cmd,
			Command::Wait {
				selector: ".spinner".into(),
				timeout: Some(3000),
				gone: Some(true),
			}
		);
	}

	#[test]
	fn screenshot_full_page_alias() {
		let cmd: Command =
			serde_json::from_str(r#"{"cmd":"screenshot","fullPage":true,"output":"shot.png"}"#)
				.unwrap();
		let Command::Screenshot { output, full_page, .. } = cmd else {
			panic!("expected screenshot");
		};
		assert_eq!(output, Some(PathBuf::from("shot.png")));
		assert_eq!(full_page, Some(true));
	}

	#[test]
	fn status_is_a_bare_tag() {
		let cmd: Command = serde_json::from_str(r#"{"cmd":"status"}"#).unwrap();
		assert_eq!(cmd, Command::Status);
		assert_eq!(cmd.auto_wait(), None);
	}
}
