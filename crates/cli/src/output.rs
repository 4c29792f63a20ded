//! Result printing for the CLI front-end.
//!
//! Text mode is for humans at a terminal; json mode prints the same
//! success/failure envelopes the HTTP server returns, so scripted callers
//! can share a parser across both surfaces.

use clap::ValueEnum;
use wv_protocol::CommandResponse;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
	#[default]
	Text,
	Json,
}

/// Print a successful command payload.
pub fn print_result(value: &serde_json::Value, format: OutputFormat) {
	match format {
		OutputFormat::Json => print_json(&CommandResponse::ok(value.clone())),
		OutputFormat::Text => {
			// Snapshot trees and bare strings read better unquoted.
			if let Some(tree) = value.get("tree").and_then(|v| v.as_str()) {
				print!("{tree}");
			} else if let Some(text) = value.as_str() {
				println!("{text}");
			} else {
				println!("{}", pretty(value));
			}
		}
	}
}

/// Print a failure. The human-readable line always goes to stderr; json mode
/// additionally emits a failure envelope on stdout for scripted callers.
pub fn print_error(message: &str, format: OutputFormat) {
	eprintln!("error: {message}");
	if format == OutputFormat::Json {
		print_json(&CommandResponse::err(message));
	}
}

/// Print one response per batch item, in order.
pub fn print_batch(responses: &[CommandResponse], format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			println!(
				"{}",
				serde_json::to_string(responses).unwrap_or_else(|_| "[]".into())
			);
		}
		OutputFormat::Text => {
			for (index, response) in responses.iter().enumerate() {
				match (&response.result, &response.error) {
					(Some(result), _) if response.success => {
						println!("[{index}] ok {}", compact(result));
					}
					(_, Some(error)) => println!("[{index}] failed: {error}"),
					_ => println!("[{index}] ok"),
				}
			}
		}
	}
}

fn print_json(response: &CommandResponse) {
	println!(
		"{}",
		serde_json::to_string(response).unwrap_or_else(|_| r#"{"success":false}"#.into())
	);
}

fn pretty(value: &serde_json::Value) -> String {
	serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn compact(value: &serde_json::Value) -> String {
	serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn format_values_parse_from_cli_names() {
		assert_eq!(
			OutputFormat::from_str("text", true).unwrap(),
			OutputFormat::Text
		);
		assert_eq!(
			OutputFormat::from_str("json", true).unwrap(),
			OutputFormat::Json
		);
	}

	#[test]
	fn pretty_and_compact_render_objects() {
		let value = serde_json::json!({"a": 1});
		assert_eq!(compact(&value), r#"{"a":1}"#);
		assert!(pretty(&value).contains("\"a\": 1"));
	}
}
