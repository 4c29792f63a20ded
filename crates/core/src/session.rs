//! Driver supervision and the live session handle.
//!
//! A [`Supervisor`] owns the at-most-one [`Session`] for this control
//! process. Connecting launches the bridge under its supervisor shell (see
//! `wv-runtime`), negotiates a WebDriver session naming the target
//! application, and blocks until the page looks interactively loaded.
//! Disconnecting closes the session best-effort and force-kills the bridge
//! tree, always leaving the supervisor idle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use wv_runtime::{BridgePorts, BridgeProcess, find_bridge_executable};

use crate::error::{Error, Result};

const NEGOTIATE_ATTEMPTS: u32 = 10;
const NEGOTIATE_RETRY_DELAY: Duration = Duration::from_millis(500);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);
const READY_SETTLE_DELAY: Duration = Duration::from_millis(500);
const READY_FINAL_GRACE: Duration = Duration::from_secs(1);

/// Rendered-markup threshold below which the page is still considered blank.
const MIN_RENDERED_BYTES: u64 = 64;

const APP_READY_JS: &str = r#"
const minBytes = arguments[0];
return document.readyState === 'complete'
	&& !!document.body
	&& document.body.innerHTML.length > minBytes;
"#;

const AUDIO_KEEPALIVE_JS: &str = r#"
if (window.__wv_keepalive) return true;
try {
	const ctx = new (window.AudioContext || window.webkitAudioContext)();
	const osc = ctx.createOscillator();
	const gain = ctx.createGain();
	gain.gain.value = 0.0001;
	osc.connect(gain);
	gain.connect(ctx.destination);
	osc.start();
	window.__wv_keepalive = ctx;
	return true;
} catch (err) {
	return false;
}
"#;

/// Connection parameters for one session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
	/// Target application binary, handed to the bridge in the capabilities.
	pub app: PathBuf,
	pub host: String,
	pub ports: BridgePorts,
	/// Deadline for the interactive-load wait after the session opens.
	pub wait_timeout: Duration,
	/// `DISPLAY` value when rendering into a virtual display.
	pub display: Option<String>,
}

impl ConnectOptions {
	pub fn new(app: impl Into<PathBuf>) -> Self {
		Self {
			app: app.into(),
			host: "127.0.0.1".into(),
			ports: BridgePorts::default(),
			wait_timeout: Duration::from_secs(10),
			display: None,
		}
	}

	pub fn webdriver_url(&self) -> String {
		format!("http://{}:{}", self.host, self.ports.port)
	}
}

/// One live automation connection: the bridge process tree plus the
/// negotiated WebDriver client.
pub struct Session {
	client: Client,
	bridge: BridgeProcess,
	app: PathBuf,
	port: u16,
}

impl Session {
	pub fn client(&self) -> &Client {
		&self.client
	}

	pub fn app(&self) -> &Path {
		&self.app
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	/// Execute script in the application context, returning the raw value.
	pub async fn eval_value(
		&self,
		script: &str,
		args: Vec<serde_json::Value>,
	) -> Result<serde_json::Value> {
		Ok(self.client.execute(script, args).await?)
	}

	/// Execute an async script; the last argument inside the script is the
	/// completion callback.
	pub async fn eval_async(
		&self,
		script: &str,
		args: Vec<serde_json::Value>,
	) -> Result<serde_json::Value> {
		Ok(self.client.execute_async(script, args).await?)
	}

	pub async fn eval_bool(&self, script: &str, args: Vec<serde_json::Value>) -> Result<bool> {
		Ok(self.eval_value(script, args).await?.as_bool().unwrap_or(false))
	}

	/// Logical window size, from the driver when possible and from the page
	/// itself otherwise.
	pub async fn window_size(&self) -> Result<(u32, u32)> {
		if let Ok((width, height)) = self.client.get_window_size().await {
			return Ok((width as u32, height as u32));
		}
		let value = self
			.eval_value("return [window.innerWidth, window.innerHeight];", vec![])
			.await?;
		let width = value.get(0).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
		let height = value.get(1).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
		Ok((width, height))
	}

	/// Best-effort focus switch to the application window. WebViews throttle
	/// unfocused renderers, so the server does this before every dispatch.
	pub async fn activate_window(&self) {
		match self.client.windows().await {
			Ok(mut windows) if !windows.is_empty() => {
				let handle = windows.remove(0);
				if let Err(err) = self.client.switch_to_window(handle).await {
					debug!(target = "wv", error = %err, "window activation failed");
				}
			}
			Ok(_) => debug!(target = "wv", "no window handles to activate"),
			Err(err) => debug!(target = "wv", error = %err, "window enumeration failed"),
		}
	}

	/// Best-effort silent audio source. A near-zero-gain oscillator keeps the
	/// renderer clocking even when the window is unfocused or virtual.
	pub async fn inject_audio_keepalive(&self) {
		match self.eval_value(AUDIO_KEEPALIVE_JS, vec![]).await {
			Ok(value) if value.as_bool() == Some(true) => {
				debug!(target = "wv", "audio keepalive active");
			}
			Ok(_) => debug!(target = "wv", "audio keepalive unavailable in this page"),
			Err(err) => debug!(target = "wv", error = %err, "audio keepalive injection failed"),
		}
	}

	/// Close the WebDriver session, returning the bridge for teardown.
	async fn close(mut self) -> BridgeProcess {
		if let Err(err) = self.client.close().await {
			debug!(target = "wv", error = %err, "session close failed, bridge kill will cover it");
		}
		self.bridge
	}
}

/// Owns the at-most-one session for this control process.
///
/// Constructed once at process start and passed by reference to dispatch and
/// the server; the one-session-per-process invariant lives here instead of in
/// a global.
#[derive(Default)]
pub struct Supervisor {
	session: Option<Session>,
}

impl Supervisor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_connected(&self) -> bool {
		self.session.is_some()
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	/// The active session, or the precondition failure every handler depends
	/// on.
	pub fn require_session(&self) -> Result<&Session> {
		self.session.as_ref().ok_or(Error::NotConnected)
	}

	/// Launch the bridge and negotiate a session against it. No-op when
	/// already connected.
	pub async fn connect(&mut self, opts: &ConnectOptions) -> Result<()> {
		if self.session.is_some() {
			return Ok(());
		}

		let exe = find_bridge_executable()?;
		let bridge = BridgeProcess::launch(&exe, opts.ports, opts.display.as_deref()).await?;

		let client = match negotiate(opts).await {
			Ok(client) => client,
			Err(err) => {
				bridge.shutdown().await;
				return Err(err);
			}
		};

		let session = Session {
			client,
			bridge,
			app: opts.app.clone(),
			port: opts.ports.port,
		};
		wait_for_app_ready(&session, opts.wait_timeout).await;

		info!(
			target = "wv",
			app = %opts.app.display(),
			port = opts.ports.port,
			"session connected"
		);
		self.session = Some(session);
		Ok(())
	}

	/// Close the session (best effort) and force-kill the bridge tree.
	/// Always leaves the supervisor idle.
	pub async fn disconnect(&mut self) {
		if let Some(session) = self.session.take() {
			let bridge = session.close().await;
			bridge.shutdown().await;
			info!(target = "wv", "session disconnected");
		}
	}
}

fn capabilities(app: &Path) -> serde_json::Map<String, serde_json::Value> {
	let mut caps = serde_json::Map::new();
	caps.insert(
		"tauri:options".into(),
		json!({ "application": app.to_string_lossy() }),
	);
	caps.insert("browserName".into(), json!("wry"));
	caps
}

/// Open the WebDriver session, retrying while the freshly launched bridge is
/// still binding its port.
async fn negotiate(opts: &ConnectOptions) -> Result<Client> {
	let url = opts.webdriver_url();
	let mut last_err: Option<Error> = None;

	for attempt in 1..=NEGOTIATE_ATTEMPTS {
		match ClientBuilder::rustls()
			.capabilities(capabilities(&opts.app))
			.connect(&url)
			.await
		{
			Ok(client) => return Ok(client),
			Err(err) => {
				debug!(target = "wv", attempt, error = %err, "session negotiation retry");
				last_err = Some(err.into());
				sleep(NEGOTIATE_RETRY_DELAY).await;
			}
		}
	}

	Err(last_err.unwrap_or_else(|| Error::WebDriver("session negotiation failed".into())))
}

/// Block until the page is interactively loaded: ready-state complete plus a
/// minimal amount of rendered markup, with a settle delay once both hold.
/// Transient script errors (mid-navigation) are retried.
///
/// On deadline the session is handed out anyway after one final fixed wait:
/// an almost-ready window beats a hard connect failure for visual testing,
/// so availability deliberately wins over strict readiness here.
async fn wait_for_app_ready(session: &Session, timeout: Duration) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		match session.eval_value(APP_READY_JS, vec![json!(MIN_RENDERED_BYTES)]).await {
			Ok(value) if value.as_bool() == Some(true) => {
				sleep(READY_SETTLE_DELAY).await;
				return true;
			}
			Ok(_) => {}
			Err(err) => {
				debug!(target = "wv", error = %err, "readiness probe failed, retrying");
			}
		}
		sleep(READY_POLL_INTERVAL).await;
	}

	warn!(target = "wv", "page never reported ready, continuing after grace period");
	sleep(READY_FINAL_GRACE).await;
	false
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn capabilities_name_the_application() {
		let caps = capabilities(Path::new("/opt/demo/demo-app"));
		assert_eq!(caps["tauri:options"]["application"], "/opt/demo/demo-app");
		assert_eq!(caps["browserName"], "wry");
	}

	#[test]
	fn connect_options_default_to_local_bridge() {
		let opts = ConnectOptions::new("/tmp/app");
		assert_eq!(opts.webdriver_url(), "http://127.0.0.1:4444");
		assert_eq!(opts.ports.native_port, 4445);
		assert!(opts.display.is_none());
	}

	#[test]
	fn ready_probe_checks_state_and_size() {
		assert!(APP_READY_JS.contains("readyState"));
		assert!(APP_READY_JS.contains("innerHTML.length"));
	}

	#[tokio::test]
	async fn require_session_fails_when_idle() {
		let supervisor = Supervisor::new();
		assert!(matches!(
			supervisor.require_session(),
			Err(Error::NotConnected)
		));
		assert!(!supervisor.is_connected());
	}
}
