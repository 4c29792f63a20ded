//! Process-tree inspection and teardown.
//!
//! The bridge spawns the native driver, which spawns the application, which
//! may spawn renderer helpers. Tearing a session down therefore means killing
//! a whole tree, deepest processes first, and treating "already exited" as
//! success rather than failure.

use std::collections::{HashMap, VecDeque};
use std::process::Command;

use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, warn};

/// Signal to deliver when killing processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSignal {
	/// Polite termination request (SIGTERM).
	Term,
	/// Unblockable kill (SIGKILL).
	Kill,
}

/// All descendant pids of `root`, breadth-first (shallowest first).
///
/// Walks direct parent links in the live process table; depth is bounded only
/// by the actual tree. The root itself is not included.
pub fn descendants_of(root: u32) -> Vec<u32> {
	let mut sys = System::new();
	sys.refresh_processes(ProcessesToUpdate::All, true);
	descendants_in(&sys, root)
}

fn descendants_in(sys: &System, root: u32) -> Vec<u32> {
	let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
	for (pid, process) in sys.processes() {
		if let Some(parent) = process.parent() {
			children.entry(parent.as_u32()).or_default().push(pid.as_u32());
		}
	}

	let mut out = Vec::new();
	let mut frontier = VecDeque::from([root]);
	while let Some(pid) = frontier.pop_front() {
		if let Some(kids) = children.get(&pid) {
			for &kid in kids {
				out.push(kid);
				frontier.push_back(kid);
			}
		}
	}
	out
}

/// Kill `root` and every descendant, deepest first.
///
/// Individual delivery failures are swallowed: a process that exited between
/// enumeration and delivery is the normal case during teardown, not an error.
pub fn kill_tree(root: u32, signal: KillSignal) {
	let descendants = descendants_of(root);
	for &pid in descendants.iter().rev() {
		send_signal(pid, signal);
	}
	send_signal(root, signal);
}

/// Best-effort kill of every process whose name contains one of `patterns`.
///
/// Used by the explicit cleanup operation to sweep up bridge, native driver,
/// and Xvfb processes left behind by earlier crashed runs. Returns how many
/// processes were signalled.
pub fn kill_by_name(patterns: &[&str], signal: KillSignal) -> usize {
	let mut sys = System::new();
	sys.refresh_processes(ProcessesToUpdate::All, true);

	let own_pid = std::process::id();
	let mut killed = 0;
	for (pid, process) in sys.processes() {
		let pid = pid.as_u32();
		if pid == own_pid {
			continue;
		}
		let name = process.name().to_string_lossy();
		if patterns.iter().any(|p| name.contains(p)) {
			debug!(target = "wv", pid, name = %name, "cleanup kill");
			send_signal(pid, signal);
			killed += 1;
		}
	}
	killed
}

/// Whether a process with this pid currently exists.
#[cfg(unix)]
pub fn process_exists(pid: u32) -> bool {
	nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn process_exists(pid: u32) -> bool {
	let mut sys = System::new();
	sys.refresh_processes(ProcessesToUpdate::All, true);
	sys.process(sysinfo::Pid::from_u32(pid)).is_some()
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: KillSignal) {
	use nix::sys::signal::Signal;

	let sig = match signal {
		KillSignal::Term => Signal::SIGTERM,
		KillSignal::Kill => Signal::SIGKILL,
	};
	if let Err(err) = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), Some(sig)) {
		debug!(target = "wv", pid, error = %err, "kill skipped");
	}
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _signal: KillSignal) {
	let mut sys = System::new();
	sys.refresh_processes(ProcessesToUpdate::All, true);
	if let Some(process) = sys.process(sysinfo::Pid::from_u32(pid)) {
		process.kill();
	}
}

/// Pids currently listening on a local TCP port, via `lsof`.
///
/// An empty result means either nothing is listening or `lsof` is not
/// available; stale-port eviction is best-effort in both cases.
pub fn pids_listening_on(port: u16) -> Vec<u32> {
	let output = Command::new("lsof")
		.args(["-ti", &format!("tcp:{port}")])
		.output();

	match output {
		Ok(out) => parse_pid_lines(&String::from_utf8_lossy(&out.stdout)),
		Err(err) => {
			warn!(target = "wv", port, error = %err, "lsof unavailable, skipping port scan");
			Vec::new()
		}
	}
}

fn parse_pid_lines(raw: &str) -> Vec<u32> {
	raw.lines().filter_map(|line| line.trim().parse().ok()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_pid_lines_handles_blanks_and_junk() {
		assert_eq!(parse_pid_lines("123\n456\n"), vec![123, 456]);
		assert_eq!(parse_pid_lines(""), Vec::<u32>::new());
		assert_eq!(parse_pid_lines("  789  \nnot-a-pid\n"), vec![789]);
	}

	#[cfg(unix)]
	mod unix {
		use std::time::{Duration, Instant};

		use super::super::*;

		/// Spawns sh -> sh -> sleep, a chain of depth 3. The trailing `true`
		/// in each layer stops the shells from exec-ing straight into their
		/// last command, which would collapse the chain.
		fn spawn_chain() -> std::process::Child {
			std::process::Command::new("sh")
				.args(["-c", "sh -c 'sleep 30; true'; true"])
				.stdout(std::process::Stdio::null())
				.spawn()
				.unwrap()
		}

		fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
			let start = Instant::now();
			while start.elapsed() < deadline {
				if check() {
					return true;
				}
				std::thread::sleep(Duration::from_millis(50));
			}
			false
		}

		#[test]
		fn descendants_of_sees_the_whole_chain() {
			let mut child = spawn_chain();
			let root = child.id();

			assert!(
				wait_until(Duration::from_secs(3), || descendants_of(root).len() >= 2),
				"chain never reached depth 3"
			);

			kill_tree(root, KillSignal::Kill);
			let _ = child.wait();
		}

		#[test]
		fn kill_tree_leaves_no_survivors() {
			let mut child = spawn_chain();
			let root = child.id();

			assert!(wait_until(Duration::from_secs(3), || {
				descendants_of(root).len() >= 2
			}));
			let descendants = descendants_of(root);

			kill_tree(root, KillSignal::Kill);
			let _ = child.wait();

			for pid in descendants {
				assert!(
					wait_until(Duration::from_secs(2), || !process_exists(pid)),
					"descendant {pid} survived kill_tree"
				);
			}
			assert!(!process_exists(root) || child.try_wait().is_ok());
		}

		#[test]
		fn kill_tree_tolerates_already_dead_members() {
			let mut child = spawn_chain();
			let root = child.id();

			assert!(wait_until(Duration::from_secs(3), || {
				descendants_of(root).len() >= 2
			}));
			let descendants = descendants_of(root);

			// Pre-kill the deepest process; kill_tree must still finish cleanly.
			if let Some(&deepest) = descendants.last() {
				send_signal(deepest, KillSignal::Kill);
			}
			kill_tree(root, KillSignal::Kill);
			let _ = child.wait();

			for pid in descendants {
				assert!(wait_until(Duration::from_secs(2), || !process_exists(pid)));
			}
		}
	}
}
