//! Wait command: element appearance and disappearance.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::info;
use wv_protocol::WaitResult;

use crate::commands::DEFAULT_WAIT_TIMEOUT_MS;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::sync;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll for the element becoming visible, or for its disappearance when
/// `gone` is set. A timeout is terminal and reports the elapsed time.
pub async fn wait_for(
	session: &Session,
	selector: &str,
	timeout_ms: Option<u64>,
	gone: bool,
) -> Result<WaitResult> {
	let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_WAIT_TIMEOUT_MS));
	info!(target = "wv", selector, gone, timeout_ms = timeout.as_millis() as u64, "wait");

	let start = Instant::now();
	let deadline = start + timeout;

	loop {
		// Transient evaluation failures (mid-navigation) don't satisfy either
		// polarity; keep polling until the page answers.
		if let Ok(visible) = sync::element_visible(session, selector).await {
			let satisfied = if gone { !visible } else { visible };
			if satisfied {
				return Ok(WaitResult {
					found: !gone,
					elapsed_ms: start.elapsed().as_millis() as u64,
				});
			}
		}
		if Instant::now() >= deadline {
			break;
		}
		sleep(POLL_INTERVAL).await;
	}

	let condition = if gone {
		format!("element gone: {selector}")
	} else {
		format!("element: {selector}")
	};
	Err(Error::Timeout {
		elapsed_ms: start.elapsed().as_millis() as u64,
		condition,
	})
}
