//! Click command.

use fantoccini::Locator;
use tracing::{debug, info};
use wv_protocol::ClickResult;

use crate::commands::DEFAULT_INTERACTIVE_TIMEOUT;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::sync::{self, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT};

/// Click the first element matching `selector`.
///
/// With autoWait the element is first waited into an interactive state and
/// the DOM is allowed to settle afterwards, so a follow-up command sees the
/// post-click page rather than a half-rendered one.
pub async fn click(session: &Session, selector: &str, auto_wait: bool) -> Result<ClickResult> {
	info!(target = "wv", selector, auto_wait, "click");

	if auto_wait {
		sync::wait_for_interactive(session, selector, DEFAULT_INTERACTIVE_TIMEOUT).await?;
	}

	if !sync::element_exists(session, selector).await? {
		return Err(Error::ElementNotFound {
			selector: selector.into(),
		});
	}
	if !sync::element_visible(session, selector).await? {
		return Err(Error::ElementNotVisible {
			selector: selector.into(),
		});
	}

	let element = session
		.client()
		.find(Locator::Css(selector))
		.await
		.map_err(|err| Error::ClickRejected {
			selector: selector.into(),
			reason: err.to_string(),
		})?;
	element.click().await.map_err(|err| Error::ClickRejected {
		selector: selector.into(),
		reason: err.to_string(),
	})?;

	if auto_wait {
		if let Err(err) = sync::wait_for_dom_stable(session, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT).await
		{
			debug!(target = "wv", error = %err, "post-click stability wait failed");
		}
	}

	Ok(ClickResult {
		selector: selector.to_string(),
	})
}
