//! Scoped kill guard: the last line of defense against orphaned trees.

use tracing::debug;

use crate::proctree::{KillSignal, kill_tree};

/// Force-kills a process tree when dropped, unless disarmed first.
///
/// Every owner of a supervised child holds one of these, so any exit path
/// that unwinds normally tears the tree down even if the owner forgot to call
/// shutdown. The supervisor shell's pipe-break trap covers the remaining
/// case: the control process dying without running destructors at all.
#[derive(Debug)]
pub struct KillGuard {
	pid: Option<u32>,
}

impl KillGuard {
	pub fn new(pid: u32) -> Self {
		Self { pid: Some(pid) }
	}

	/// The guarded root pid, if still armed.
	pub fn pid(&self) -> Option<u32> {
		self.pid
	}

	/// Release the guard without killing; used after an orderly shutdown has
	/// already reaped the tree.
	pub fn disarm(&mut self) {
		self.pid = None;
	}
}

impl Drop for KillGuard {
	fn drop(&mut self) {
		if let Some(pid) = self.pid.take() {
			debug!(target = "wv", pid, "kill guard firing");
			kill_tree(pid, KillSignal::Kill);
		}
	}
}
