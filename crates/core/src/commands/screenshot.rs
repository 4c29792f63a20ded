//! Screenshot command: multi-strategy capture with ordered fallbacks.
//!
//! No single capture path works everywhere. A virtual display renders into a
//! framebuffer we can grab directly; a real display serves the bridge's
//! native screenshot; a page with CORS-clean assets renders via html2canvas;
//! and a hostile page still yields at least a text-painted canvas. Each
//! strategy's failure is logged and chained into the next, and every success
//! reports which method produced the bytes so callers can assert on it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};
use wv_protocol::{CaptureMethod, ScreenshotResult};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::sync::{self, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT};

const XVFB_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
const NATIVE_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
const H2C_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
const H2C_RENDER_TIMEOUT: Duration = Duration::from_secs(15);
const FALLBACK_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

const H2C_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/html2canvas@1.4.1/dist/html2canvas.min.js";

const H2C_INJECT_JS: &str = r#"
if (window.html2canvas) return 'ready';
if (!document.getElementById('__wv_html2canvas')) {
	const s = document.createElement('script');
	s.id = '__wv_html2canvas';
	s.src = arguments[0];
	document.head.appendChild(s);
}
return 'loading';
"#;

const H2C_RENDER_JS: &str = r#"
const fullPage = arguments[0];
const done = arguments[1];
const opts = { useCORS: true, allowTaint: true, logging: false, backgroundColor: null };
if (fullPage && document.body) {
	opts.height = document.body.scrollHeight;
	opts.windowHeight = document.body.scrollHeight;
}
window.html2canvas(document.body, opts)
	.then(function (canvas) { done(canvas.toDataURL('image/png')); })
	.catch(function (err) { done('error: ' + (err && err.message ? err.message : String(err))); });
"#;

const DOM_FALLBACK_JS: &str = r#"
const done = arguments[0];
const width = Math.max(1, window.innerWidth);
const height = Math.max(1, window.innerHeight);
const canvas = document.createElement('canvas');
canvas.width = width;
canvas.height = height;
const ctx = canvas.getContext('2d');
ctx.fillStyle = '#ffffff';
ctx.fillRect(0, 0, width, height);

function finishWithText() {
	try {
		ctx.fillStyle = '#000000';
		ctx.font = '12px monospace';
		const lines = (document.body ? document.body.innerText : '').split('\n');
		let y = 16;
		for (const line of lines) {
			if (y > height) break;
			ctx.fillText(line.slice(0, 200), 8, y);
			y += 14;
		}
		done(canvas.toDataURL('image/png'));
	} catch (err) {
		done('error: ' + (err && err.message ? err.message : String(err)));
	}
}

try {
	const markup = new XMLSerializer().serializeToString(document.documentElement);
	const svg = '<svg xmlns="http://www.w3.org/2000/svg" width="' + width + '" height="' + height + '">'
		+ '<foreignObject width="100%" height="100%">' + markup + '</foreignObject></svg>';
	const img = new Image();
	img.onload = function () {
		try {
			ctx.drawImage(img, 0, 0);
			done(canvas.toDataURL('image/png'));
		} catch (err) {
			finishWithText();
		}
	};
	img.onerror = function () { finishWithText(); };
	img.src = 'data:image/svg+xml;charset=utf-8,' + encodeURIComponent(svg);
} catch (err) {
	finishWithText();
}
"#;

/// Strategy order for the current environment.
///
/// Native capture waits on a display link that a virtual display never
/// delivers, so under Xvfb it can hang rather than fail; it is skipped
/// outright there instead of being raced against a timer.
fn strategy_order(virtual_display: bool) -> Vec<CaptureMethod> {
	if virtual_display {
		vec![
			CaptureMethod::Xvfb,
			CaptureMethod::Html2canvas,
			CaptureMethod::DomFallback,
		]
	} else {
		vec![
			CaptureMethod::Native,
			CaptureMethod::Html2canvas,
			CaptureMethod::DomFallback,
		]
	}
}

/// Capture the rendered window, trying each applicable strategy in order.
pub async fn screenshot(
	session: &Session,
	display: Option<&str>,
	output: Option<&Path>,
	full_page: bool,
	auto_wait: bool,
) -> Result<ScreenshotResult> {
	let virtual_display = display.is_some();
	info!(target = "wv", full_page, virtual_display, "screenshot");

	if auto_wait {
		if let Err(err) = sync::wait_for_dom_stable(session, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT).await
		{
			debug!(target = "wv", error = %err, "pre-capture stability wait failed");
		}
	}

	// Falls back to the standard virtual-display geometry when neither the
	// driver nor the page can answer; dimensions are part of the result
	// contract and must stay nonzero.
	let (width, height) = match session.window_size().await {
		Ok((width, height)) if width > 0 && height > 0 => (width, height),
		_ => (1280, 800),
	};
	let mut failures: Vec<String> = Vec::new();

	for method in strategy_order(display.is_some()) {
		let attempt = match method {
			CaptureMethod::Xvfb => match display {
				Some(display) => capture_xvfb(display).await,
				None => Err("no virtual display active".into()),
			},
			CaptureMethod::Native => capture_native(session).await,
			CaptureMethod::Html2canvas => capture_html2canvas(session, full_page).await,
			CaptureMethod::DomFallback => capture_dom_fallback(session).await,
		};

		match attempt {
			Ok(bytes) => {
				info!(target = "wv", method = %method, bytes = bytes.len(), "capture succeeded");
				return finish(bytes, width, height, method, output);
			}
			Err(message) => {
				warn!(target = "wv", method = %method, error = %message, "capture strategy failed");
				failures.push(format!("{method}: {message}"));
			}
		}
	}

	Err(Error::Screenshot(failures.join("; ")))
}

/// Package the captured bytes as a file or inline base64.
fn finish(
	bytes: Vec<u8>,
	width: u32,
	height: u32,
	method: CaptureMethod,
	output: Option<&Path>,
) -> Result<ScreenshotResult> {
	match output {
		Some(path) => {
			if let Some(parent) = path.parent() {
				if !parent.as_os_str().is_empty() && !parent.exists() {
					std::fs::create_dir_all(parent)?;
				}
			}
			std::fs::write(path, &bytes)?;
			Ok(ScreenshotResult {
				path: Some(PathBuf::from(path)),
				base64: None,
				width,
				height,
				method,
			})
		}
		None => Ok(ScreenshotResult {
			path: None,
			base64: Some(BASE64.encode(&bytes)),
			width,
			height,
			method,
		}),
	}
}

/// Grab the virtual display's framebuffer directly. Bypasses every in-page
/// canvas and CORS restriction: this is exactly what is rendered.
async fn capture_xvfb(display: &str) -> std::result::Result<Vec<u8>, String> {
	let run = tokio::process::Command::new("import")
		.args(["-display", display, "-window", "root", "png:-"])
		.output();

	let out = timeout(XVFB_CAPTURE_TIMEOUT, run)
		.await
		.map_err(|_| "framebuffer capture timed out".to_string())?
		.map_err(|err| format!("import failed to run: {err}"))?;

	if !out.status.success() {
		return Err(format!("import exited with {}", out.status));
	}
	if out.stdout.is_empty() {
		return Err("import produced no image data".into());
	}
	Ok(out.stdout)
}

async fn capture_native(session: &Session) -> std::result::Result<Vec<u8>, String> {
	match timeout(NATIVE_CAPTURE_TIMEOUT, session.client().screenshot()).await {
		Ok(Ok(bytes)) if !bytes.is_empty() => Ok(bytes),
		Ok(Ok(_)) => Err("native capture returned an empty image".into()),
		Ok(Err(err)) => Err(format!("native capture failed: {err}")),
		Err(_) => Err("native capture timed out".into()),
	}
}

async fn capture_html2canvas(
	session: &Session,
	full_page: bool,
) -> std::result::Result<Vec<u8>, String> {
	ensure_html2canvas(session).await?;

	let rendered = timeout(
		H2C_RENDER_TIMEOUT,
		session.eval_async(H2C_RENDER_JS, vec![json!(full_page)]),
	)
	.await
	.map_err(|_| "html2canvas render timed out".to_string())?
	.map_err(|err| format!("html2canvas render failed: {err}"))?;

	data_url_to_png(rendered.as_str().unwrap_or_default())
}

/// Inject the html2canvas library from its CDN if the page does not already
/// have it, then wait for the script to load.
async fn ensure_html2canvas(session: &Session) -> std::result::Result<(), String> {
	let state = session
		.eval_value(H2C_INJECT_JS, vec![json!(H2C_CDN_URL)])
		.await
		.map_err(|err| format!("html2canvas injection failed: {err}"))?;
	if state.as_str() == Some("ready") {
		return Ok(());
	}

	let deadline = Instant::now() + H2C_LOAD_TIMEOUT;
	while Instant::now() < deadline {
		sleep(Duration::from_millis(100)).await;
		if let Ok(loaded) = session.eval_bool("return !!window.html2canvas;", vec![]).await {
			if loaded {
				return Ok(());
			}
		}
	}
	Err("html2canvas never loaded from the CDN".into())
}

async fn capture_dom_fallback(session: &Session) -> std::result::Result<Vec<u8>, String> {
	let rendered = timeout(
		FALLBACK_RENDER_TIMEOUT,
		session.eval_async(DOM_FALLBACK_JS, vec![]),
	)
	.await
	.map_err(|_| "dom fallback render timed out".to_string())?
	.map_err(|err| format!("dom fallback render failed: {err}"))?;

	data_url_to_png(rendered.as_str().unwrap_or_default())
}

/// Decode a `data:image/png;base64,...` payload, passing through in-page
/// `error: ...` sentinels as failures.
fn data_url_to_png(data: &str) -> std::result::Result<Vec<u8>, String> {
	if let Some(message) = data.strip_prefix("error: ") {
		return Err(message.to_string());
	}
	let b64 = data.strip_prefix("data:image/png;base64,").ok_or_else(|| {
		let preview: String = data.chars().take(40).collect();
		format!("unexpected canvas payload: {preview:?}")
	})?;
	let bytes = BASE64
		.decode(b64)
		.map_err(|err| format!("canvas payload was not valid base64: {err}"))?;
	if bytes.is_empty() {
		return Err("canvas produced an empty image".into());
	}
	Ok(bytes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn native_capture_is_skipped_under_virtual_display() {
		let order = strategy_order(true);
		assert_eq!(order[0], CaptureMethod::Xvfb);
		assert!(!order.contains(&CaptureMethod::Native));
	}

	#[test]
	fn real_display_starts_with_native() {
		let order = strategy_order(false);
		assert_eq!(order[0], CaptureMethod::Native);
		assert!(!order.contains(&CaptureMethod::Xvfb));
		assert_eq!(*order.last().unwrap(), CaptureMethod::DomFallback);
	}

	#[test]
	fn data_url_decoding_round_trips() {
		let encoded = format!("data:image/png;base64,{}", BASE64.encode(b"png-bytes"));
		assert_eq!(data_url_to_png(&encoded).unwrap(), b"png-bytes");
	}

	#[test]
	fn in_page_error_sentinel_becomes_failure() {
		let err = data_url_to_png("error: canvas tainted").unwrap_err();
		assert_eq!(err, "canvas tainted");
	}

	#[test]
	fn junk_payload_is_rejected() {
		assert!(data_url_to_png("").is_err());
		assert!(data_url_to_png("data:image/jpeg;base64,xxxx").is_err());
	}

	#[test]
	fn finish_writes_file_and_reports_method() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("shots").join("out.png");

		let result = finish(vec![1, 2, 3], 800, 600, CaptureMethod::Xvfb, Some(&path)).unwrap();
		assert_eq!(result.path.as_deref(), Some(path.as_path()));
		assert_eq!(result.base64, None);
		assert_eq!(result.method, CaptureMethod::Xvfb);
		assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
	}

	#[test]
	fn finish_without_output_inlines_base64() {
		let result = finish(b"abc".to_vec(), 10, 20, CaptureMethod::DomFallback, None).unwrap();
		assert_eq!(result.base64.as_deref(), Some("YWJj"));
		assert_eq!(result.path, None);
		assert_eq!((result.width, result.height), (10, 20));
	}

	#[test]
	fn render_scripts_tolerate_cors() {
		assert!(H2C_RENDER_JS.contains("useCORS: true"));
		assert!(H2C_RENDER_JS.contains("allowTaint: true"));
		assert!(DOM_FALLBACK_JS.contains("foreignObject"));
		assert!(DOM_FALLBACK_JS.contains("fillText"));
	}
}
