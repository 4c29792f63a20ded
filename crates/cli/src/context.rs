//! Explicit application context shared by every front-end.
//!
//! The process-wide singletons of this kind of tool (the session, the
//! virtual display) live here as plain fields, constructed once at startup
//! and passed by reference into dispatch. One context per process is the
//! whole concurrency story.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use wv::{ConnectOptions, Supervisor};
use wv_runtime::{BridgePorts, XvfbDisplay};

const XVFB_WIDTH: u32 = 1280;
const XVFB_HEIGHT: u32 = 800;

/// Settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
	pub app: Option<PathBuf>,
	pub ports: BridgePorts,
	pub connect_timeout: Duration,
	pub auto_wait_default: bool,
	pub use_xvfb: bool,
}

/// Everything a dispatch needs: the supervisor owning the at-most-one
/// session, the at-most-one virtual display, and the resolved settings.
pub struct AppContext {
	pub supervisor: Supervisor,
	pub display: Option<XvfbDisplay>,
	pub settings: Settings,
}

impl AppContext {
	pub fn new(settings: Settings) -> Self {
		Self {
			supervisor: Supervisor::new(),
			display: None,
			settings,
		}
	}

	/// Start the virtual display when requested and not already running.
	pub async fn ensure_display(&mut self) -> anyhow::Result<()> {
		if self.settings.use_xvfb && self.display.is_none() {
			let display = XvfbDisplay::start(XVFB_WIDTH, XVFB_HEIGHT)
				.await
				.context("failed to start virtual display")?;
			self.display = Some(display);
		}
		Ok(())
	}

	/// `DISPLAY` value of the active virtual display, if any.
	pub fn display_name(&self) -> Option<String> {
		self.display.as_ref().map(XvfbDisplay::name)
	}

	/// Connect the supervisor using the resolved settings.
	pub async fn connect(&mut self) -> anyhow::Result<()> {
		let app = self
			.settings
			.app
			.clone()
			.context("no application path: pass --app or set WV_APP")?;

		let mut opts = ConnectOptions::new(app);
		opts.ports = self.settings.ports;
		opts.wait_timeout = self.settings.connect_timeout;
		opts.display = self.display_name();

		self.supervisor.connect(&opts).await?;
		Ok(())
	}

	/// Tear down session and display. Safe to call when already idle.
	pub async fn shutdown(&mut self) {
		self.supervisor.disconnect().await;
		if let Some(display) = self.display.take() {
			display.stop().await;
		}
	}
}
