//! Xvfb virtual display handle.
//!
//! Linux CI boxes have no physical display; the target application renders
//! into an Xvfb framebuffer instead. At most one display is owned per control
//! process, started explicitly and torn down on stop or process exit via the
//! usual kill guard.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::{Error, Result};
use crate::guard::KillGuard;
use crate::proctree::{KillSignal, kill_tree};

const DISPLAY_RANGE: std::ops::RangeInclusive<u32> = 99..=199;
const STARTUP_PROBE_DELAY: Duration = Duration::from_millis(300);

/// A running Xvfb server and the display number it owns.
#[derive(Debug)]
pub struct XvfbDisplay {
	child: Child,
	guard: KillGuard,
	number: u32,
}

impl XvfbDisplay {
	/// Start an Xvfb server on the first free display number.
	pub async fn start(width: u32, height: u32) -> Result<Self> {
		if cfg!(not(unix)) {
			return Err(Error::Display("Xvfb is only available on unix".into()));
		}

		let number = first_free_display(Path::new("/tmp"))
			.ok_or_else(|| Error::Display("no free display number".into()))?;

		let mut child = Command::new("Xvfb")
			.arg(format!(":{number}"))
			.args(["-screen", "0", &format!("{width}x{height}x24")])
			.args(["-nolisten", "tcp"])
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.map_err(|source| Error::Spawn {
				what: "Xvfb",
				source,
			})?;

		// Xvfb exits immediately when the display is taken or the binary is
		// misconfigured; catch that instead of handing out a dead display.
		tokio::time::sleep(STARTUP_PROBE_DELAY).await;
		if let Ok(Some(status)) = child.try_wait() {
			return Err(Error::Display(format!("Xvfb exited at startup: {status}")));
		}

		let pid = child
			.id()
			.ok_or_else(|| Error::Display("Xvfb exited at startup".into()))?;
		info!(target = "wv", display = number, pid, "virtual display up");

		Ok(Self {
			child,
			guard: KillGuard::new(pid),
			number,
		})
	}

	/// The `DISPLAY` value for processes rendering into this framebuffer.
	pub fn name(&self) -> String {
		format!(":{}", self.number)
	}

	pub async fn stop(mut self) {
		if let Some(pid) = self.guard.pid() {
			kill_tree(pid, KillSignal::Term);
		}
		self.guard.disarm();
		let _ = self.child.wait().await;
	}
}

/// First display number in the conventional range without an X lock file.
fn first_free_display(lock_dir: &Path) -> Option<u32> {
	DISPLAY_RANGE.into_iter().find(|n| !lock_dir.join(format!(".X{n}-lock")).exists())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_free_display_skips_locked_numbers() {
		let dir = tempfile::TempDir::new().unwrap();
		assert_eq!(first_free_display(dir.path()), Some(99));

		std::fs::write(dir.path().join(".X99-lock"), "1").unwrap();
		std::fs::write(dir.path().join(".X100-lock"), "1").unwrap();
		assert_eq!(first_free_display(dir.path()), Some(101));
	}

	#[test]
	fn exhausted_range_yields_none() {
		let dir = tempfile::TempDir::new().unwrap();
		for n in DISPLAY_RANGE {
			std::fs::write(dir.path().join(format!(".X{n}-lock")), "1").unwrap();
		}
		assert_eq!(first_free_display(dir.path()), None);
	}
}
