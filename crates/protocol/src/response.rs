//! Result envelopes and per-command payload shapes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Uniform success/failure envelope returned by every front-end.
///
/// Exactly one of `result` / `error` is populated; the envelope is never
/// partially filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<serde_json::Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl CommandResponse {
	pub fn ok(result: serde_json::Value) -> Self {
		Self {
			success: true,
			result: Some(result),
			error: None,
		}
	}

	pub fn err(message: impl Into<String>) -> Self {
		Self {
			success: false,
			result: None,
			error: Some(message.into()),
		}
	}
}

/// The single machine-readable line the server prints on stdout once it is
/// accepting requests. External tooling polls for this exact shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyLine {
	pub status: String,
	pub port: u16,
	pub url: String,
}

impl ReadyLine {
	pub fn new(port: u16) -> Self {
		Self {
			status: "ready".into(),
			port,
			url: format!("http://127.0.0.1:{port}"),
		}
	}
}

/// Which capture strategy produced the screenshot bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMethod {
	/// Framebuffer grab of the active virtual display.
	Xvfb,
	/// The bridge's native whole-window screenshot.
	Native,
	/// In-page html2canvas rendering.
	Html2canvas,
	/// SVG-serialization / text-paint canvas of last resort.
	DomFallback,
}

impl CaptureMethod {
	pub fn as_str(self) -> &'static str {
		match self {
			CaptureMethod::Xvfb => "xvfb",
			CaptureMethod::Native => "native",
			CaptureMethod::Html2canvas => "html2canvas",
			CaptureMethod::DomFallback => "dom-fallback",
		}
	}
}

impl std::fmt::Display for CaptureMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Screenshot payload: either a file path or inline base64, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotResult {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub base64: Option<String>,
	pub width: u32,
	pub height: u32,
	pub method: CaptureMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResult {
	pub selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeResult {
	pub selector: String,
	pub chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitResult {
	pub found: bool,
	pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResult {
	/// Indented accessibility listing, one element per line.
	pub tree: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepResult {
	pub slept_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
	pub connected: bool,
	pub bridge_port: u16,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub app: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn success_envelope_omits_error() {
		let json = serde_json::to_string(&CommandResponse::ok(serde_json::json!({"x": 1}))).unwrap();
		assert_eq!(json, r#"{"success":true,"result":{"x":1}}"#);
	}

	#[test]
	fn failure_envelope_omits_result() {
		let json = serde_json::to_string(&CommandResponse::err("element not found: #a")).unwrap();
		assert_eq!(json, r#"{"success":false,"error":"element not found: #a"}"#);
	}

	#[test]
	fn ready_line_shape_is_stable() {
		let json = serde_json::to_string(&ReadyLine::new(9222)).unwrap();
		assert_eq!(
			json,
			r#"{"status":"ready","port":9222,"url":"http://127.0.0.1:9222"}"#
		);
	}

	#[test]
	fn capture_method_serializes_kebab_case() {
		assert_eq!(
			serde_json::to_string(&CaptureMethod::DomFallback).unwrap(),
			r#""dom-fallback""#
		);
		assert_eq!(CaptureMethod::Html2canvas.as_str(), "html2canvas");
	}

	#[test]
	fn screenshot_result_reports_method() {
		let result = ScreenshotResult {
			path: None,
			base64: Some("aGk=".into()),
			width: 800,
			height: 600,
			method: CaptureMethod::Native,
		};
		let value = serde_json::to_value(&result).unwrap();
		assert_eq!(value["method"], "native");
		assert_eq!(value["width"], 800);
		assert!(value.get("path").is_none());
	}
}
