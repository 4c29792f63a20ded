//! WebDriver bridge lifecycle.
//!
//! The bridge (tauri-driver) translates WebDriver wire commands into native
//! WebView automation calls. It owns the fixed control port and an adjacent
//! port for the platform's native driver, so exactly one healthy instance can
//! exist per machine; launch therefore starts by evicting stale listeners.
//!
//! The bridge is never spawned directly. It runs under a small supervisor
//! shell whose stdin is a pipe from the control process: the shell puts the
//! bridge into its own process group, blocks reading stdin, and kills the
//! group from an exit trap. When the control process dies - including by
//! SIGKILL, where no Rust cleanup can run - the pipe closes, the read returns
//! end-of-stream, and the trap fires. No orphaned bridge survives.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::guard::KillGuard;
use crate::proctree::{KillSignal, kill_tree, pids_listening_on};

/// Default tauri-driver control port.
pub const DEFAULT_BRIDGE_PORT: u16 = 4444;

/// How long to scan bridge output for the readiness marker.
const READY_SCAN_WINDOW: Duration = Duration::from_secs(5);

/// Grace period granted when the marker never appears.
const READY_FALLBACK_DELAY: Duration = Duration::from_secs(2);

#[cfg(windows)]
const BRIDGE_EXE: &str = "tauri-driver.exe";
#[cfg(not(windows))]
const BRIDGE_EXE: &str = "tauri-driver";

/// Supervisor shell wrapped around the bridge.
///
/// `$1` is the bridge executable, `$2`/`$3` the port pair. `set -m` puts the
/// background job in its own process group so the trap can kill the whole
/// group, and the `read` loop blocks until the control process's end of the
/// stdin pipe goes away.
#[cfg(unix)]
const SUPERVISOR_SH: &str = r#"
set -m
"$1" --port "$2" --native-port "$3" 2>&1 &
bridge=$!
trap 'kill -KILL -- -"$bridge" 2>/dev/null' EXIT
while read -r _; do :; done
"#;

/// The bridge's control port and the adjacent native-driver port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgePorts {
	pub port: u16,
	pub native_port: u16,
}

impl BridgePorts {
	pub fn new(port: u16) -> Self {
		Self {
			port,
			native_port: port + 1,
		}
	}
}

impl Default for BridgePorts {
	fn default() -> Self {
		Self::new(DEFAULT_BRIDGE_PORT)
	}
}

/// Locate the bridge executable.
///
/// Search order: `WV_BRIDGE_PATH` (runtime override), `PATH`, then the cargo
/// install directory. Whether the executable actually works is discovered at
/// launch; this only resolves a path.
pub fn find_bridge_executable() -> Result<PathBuf> {
	if let Ok(path) = std::env::var("WV_BRIDGE_PATH") {
		let path = PathBuf::from(path);
		if path.exists() {
			return Ok(path);
		}
		warn!(target = "wv.bridge", path = %path.display(), "WV_BRIDGE_PATH does not exist, falling back");
	}

	if let Ok(path) = which::which(BRIDGE_EXE) {
		return Ok(path);
	}

	if let Some(home) = dirs::home_dir() {
		let cargo_bin = home.join(".cargo").join("bin").join(BRIDGE_EXE);
		if cargo_bin.exists() {
			return Ok(cargo_bin);
		}
	}

	Err(Error::BridgeNotFound)
}

/// A running bridge under its supervisor shell.
///
/// Holding this value keeps the stdin pipe open. Dropping it closes the pipe
/// (letting the supervisor's trap fire) and arms the [`KillGuard`] as a
/// second, independent teardown path.
#[derive(Debug)]
pub struct BridgeProcess {
	child: Child,
	// Kept open for the process lifetime; closing it is the shutdown signal.
	_stdin: ChildStdin,
	pid: u32,
	guard: KillGuard,
	ports: BridgePorts,
}

impl BridgeProcess {
	/// Evict stale listeners, spawn the supervised bridge, and wait for it to
	/// accept connections.
	///
	/// Readiness is detected by scanning the bridge's merged stdout/stderr for
	/// a "listening" marker. Some bridge builds print nothing on startup, so a
	/// missing marker downgrades to a fixed delay rather than a failure.
	pub async fn launch(
		exe: &std::path::Path,
		ports: BridgePorts,
		display: Option<&str>,
	) -> Result<Self> {
		evict_stale_listeners(ports);

		let mut child = spawn_supervised(exe, ports, display)?;
		let pid = child
			.id()
			.ok_or_else(|| Error::BridgeExited("exited before startup".into()))?;

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| Error::BridgeExited("stdin pipe missing".into()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::BridgeExited("stdout pipe missing".into()))?;

		let (tx, rx) = mpsc::unbounded_channel();
		tokio::spawn(async move {
			let mut lines = BufReader::new(stdout).lines();
			while let Ok(Some(line)) = lines.next_line().await {
				debug!(target = "wv.bridge", line = %line, "bridge output");
				let _ = tx.send(line);
			}
		});

		let marker_seen = scan_for_marker(rx, READY_SCAN_WINDOW).await;
		if marker_seen {
			info!(target = "wv.bridge", pid, port = ports.port, "bridge listening");
		} else {
			debug!(
				target = "wv.bridge",
				pid, "no readiness marker seen, granting fixed startup delay"
			);
			tokio::time::sleep(READY_FALLBACK_DELAY).await;
		}

		if let Ok(Some(status)) = child.try_wait() {
			return Err(Error::BridgeExited(status.to_string()));
		}

		Ok(Self {
			child,
			_stdin: stdin,
			pid,
			guard: KillGuard::new(pid),
			ports,
		})
	}

	/// Pid of the supervisor shell (the root of the bridge tree).
	pub fn pid(&self) -> u32 {
		self.pid
	}

	pub fn ports(&self) -> BridgePorts {
		self.ports
	}

	/// Force-kill the whole bridge tree and reap the supervisor.
	pub async fn shutdown(mut self) {
		kill_tree(self.pid, KillSignal::Kill);
		self.guard.disarm();
		let _ = self.child.wait().await;
	}
}

#[cfg(unix)]
fn spawn_supervised(
	exe: &std::path::Path,
	ports: BridgePorts,
	display: Option<&str>,
) -> Result<Child> {
	let mut cmd = Command::new("sh");
	cmd.arg("-c")
		.arg(SUPERVISOR_SH)
		.arg("wv-bridge-supervisor")
		.arg(exe)
		.arg(ports.port.to_string())
		.arg(ports.native_port.to_string())
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::null());
	if let Some(display) = display {
		cmd.env("DISPLAY", display);
	}
	cmd.spawn().map_err(|source| Error::Spawn {
		what: "bridge supervisor",
		source,
	})
}

#[cfg(not(unix))]
fn spawn_supervised(
	exe: &std::path::Path,
	ports: BridgePorts,
	display: Option<&str>,
) -> Result<Child> {
	// No process groups or pipe traps here; the kill guard and job objects
	// created by kill_on_drop carry the teardown burden.
	let mut cmd = Command::new(exe);
	cmd.arg("--port")
		.arg(ports.port.to_string())
		.arg("--native-port")
		.arg(ports.native_port.to_string())
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::null())
		.kill_on_drop(true);
	if let Some(display) = display {
		cmd.env("DISPLAY", display);
	}
	cmd.spawn().map_err(|source| Error::Spawn {
		what: "bridge",
		source,
	})
}

/// Kill anything already bound to the bridge's port pair.
pub fn evict_stale_listeners(ports: BridgePorts) {
	for port in [ports.port, ports.native_port] {
		for pid in pids_listening_on(port) {
			warn!(target = "wv.bridge", pid, port, "evicting stale listener");
			kill_tree(pid, KillSignal::Kill);
		}
	}
}

/// Drain `rx` until a readiness marker shows up or the window closes.
async fn scan_for_marker(mut rx: mpsc::UnboundedReceiver<String>, window: Duration) -> bool {
	let deadline = Instant::now() + window;
	loop {
		let remaining = deadline.saturating_duration_since(Instant::now());
		if remaining.is_zero() {
			return false;
		}
		match timeout(remaining, rx.recv()).await {
			Ok(Some(line)) if line_marks_ready(&line) => return true,
			Ok(Some(_)) => continue,
			// Output closed or window elapsed.
			Ok(None) | Err(_) => return false,
		}
	}
}

fn line_marks_ready(line: &str) -> bool {
	line.to_ascii_lowercase().contains("listening")
}
