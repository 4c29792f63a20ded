//! Synchronization primitives over the live session.
//!
//! Commands that mutate the DOM (click, type) or read it wholesale
//! (screenshot, snapshot) are only reliable once the page has stopped
//! re-rendering. [`wait_for_dom_stable`] trades a small fixed latency for
//! that reliability; [`wait_for_interactive`] gates input commands on the
//! target element actually being hittable.

use std::time::Duration;

use serde_json::json;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::Session;

/// Quiet period that must elapse after the last structural mutation.
pub const DOM_STABLE_SETTLE: Duration = Duration::from_millis(100);

/// Hard upper bound for the stability wait.
pub const DOM_STABLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Window in which a page with no structural churn is declared stable
/// immediately.
const DOM_STABLE_GRACE_MS: u64 = 30;

const INTERACTIVE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why the stability wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StableOutcome {
	/// No structural mutation during the grace window.
	Idle,
	/// Mutations happened, then a full settle period passed without more.
	Settled,
	/// Mutations never stopped; the absolute timeout fired.
	TimedOut,
}

impl StableOutcome {
	fn from_reason(reason: &str) -> Self {
		match reason {
			"idle" => StableOutcome::Idle,
			"settled" => StableOutcome::Settled,
			_ => StableOutcome::TimedOut,
		}
	}
}

/// Mutation-observer wait. Only element additions/removals and text changes
/// count; attribute-only churn (hover and focus class toggles) would produce
/// endless false "still changing" signals and is not observed at all.
const DOM_STABLE_JS: &str = r#"
const settleMs = arguments[0];
const timeoutMs = arguments[1];
const graceMs = arguments[2];
const done = arguments[3];

const target = document.body;
if (!target) { done('idle'); return; }

let finished = false;
let sawStructural = false;
let settleTimer = null;

function finish(reason) {
	if (finished) return;
	finished = true;
	observer.disconnect();
	done(reason);
}

const observer = new MutationObserver(function (mutations) {
	let structural = false;
	for (const m of mutations) {
		if (m.type === 'childList' || m.type === 'characterData') { structural = true; break; }
	}
	if (!structural) return;
	sawStructural = true;
	if (settleTimer) clearTimeout(settleTimer);
	settleTimer = setTimeout(function () { finish('settled'); }, settleMs);
});
observer.observe(target, { childList: true, characterData: true, subtree: true });

setTimeout(function () { if (!sawStructural) finish('idle'); }, graceMs);
setTimeout(function () { finish('timeout'); }, timeoutMs);
"#;

const ELEMENT_EXISTS_JS: &str = "return !!document.querySelector(arguments[0]);";

const ELEMENT_VISIBLE_JS: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) return false;
const style = window.getComputedStyle(el);
if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') return false;
const rect = el.getBoundingClientRect();
return rect.width > 0 && rect.height > 0;
"#;

const ELEMENT_CLICKABLE_JS: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) return false;
if (el.disabled) return false;
const rect = el.getBoundingClientRect();
const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
if (!hit) return false;
return hit === el || el.contains(hit) || hit.contains(el);
"#;

/// Wait until the body subtree stops mutating structurally, or until the
/// absolute timeout.
pub async fn wait_for_dom_stable(
	session: &Session,
	settle: Duration,
	timeout: Duration,
) -> Result<StableOutcome> {
	let value = session
		.eval_async(
			DOM_STABLE_JS,
			vec![
				json!(settle.as_millis() as u64),
				json!(timeout.as_millis() as u64),
				json!(DOM_STABLE_GRACE_MS),
			],
		)
		.await?;
	let outcome = StableOutcome::from_reason(value.as_str().unwrap_or("timeout"));
	debug!(target = "wv", ?outcome, "dom stability wait finished");
	Ok(outcome)
}

pub async fn element_exists(session: &Session, selector: &str) -> Result<bool> {
	session.eval_bool(ELEMENT_EXISTS_JS, vec![json!(selector)]).await
}

pub async fn element_visible(session: &Session, selector: &str) -> Result<bool> {
	session.eval_bool(ELEMENT_VISIBLE_JS, vec![json!(selector)]).await
}

pub async fn element_clickable(session: &Session, selector: &str) -> Result<bool> {
	session.eval_bool(ELEMENT_CLICKABLE_JS, vec![json!(selector)]).await
}

/// Wait for the element to become visible, then clickable (not obscured, not
/// disabled). Both sub-waits share one deadline.
pub async fn wait_for_interactive(
	session: &Session,
	selector: &str,
	timeout: Duration,
) -> Result<()> {
	let start = Instant::now();
	let deadline = start + timeout;

	loop {
		if element_visible(session, selector).await? {
			break;
		}
		if Instant::now() >= deadline {
			return Err(Error::Timeout {
				elapsed_ms: start.elapsed().as_millis() as u64,
				condition: format!("element visible: {selector}"),
			});
		}
		sleep(INTERACTIVE_POLL_INTERVAL).await;
	}

	loop {
		if element_clickable(session, selector).await? {
			return Ok(());
		}
		if Instant::now() >= deadline {
			return Err(Error::Timeout {
				elapsed_ms: start.elapsed().as_millis() as u64,
				condition: format!("element clickable: {selector}"),
			});
		}
		sleep(INTERACTIVE_POLL_INTERVAL).await;
	}
}
