//! Type command: set an element's value.
//!
//! Values are written through the native property setter and announced with
//! synthesized `input`/`change` events. Frameworks that shadow `.value` with
//! their own accessor (React, Vue) only notice programmatic writes done this
//! way; per-key synthetic events buy nothing extra in a WebView we control.

use serde_json::json;
use tracing::{debug, info};
use wv_protocol::TypeResult;

use crate::commands::DEFAULT_INTERACTIVE_TIMEOUT;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::sync::{self, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT};

const SET_VALUE_JS: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) return false;
const value = arguments[1];
const proto = el instanceof HTMLTextAreaElement
	? HTMLTextAreaElement.prototype
	: HTMLInputElement.prototype;
const desc = Object.getOwnPropertyDescriptor(proto, 'value');
if (desc && desc.set && (el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement)) {
	desc.set.call(el, value);
} else if ('value' in el) {
	el.value = value;
} else {
	el.textContent = value;
}
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

/// Set the value of the first element matching `selector`.
pub async fn type_text(
	session: &Session,
	selector: &str,
	text: &str,
	auto_wait: bool,
) -> Result<TypeResult> {
	info!(target = "wv", selector, chars = text.chars().count(), auto_wait, "type");

	if auto_wait {
		sync::wait_for_interactive(session, selector, DEFAULT_INTERACTIVE_TIMEOUT).await?;
	}

	let found = session
		.eval_bool(SET_VALUE_JS, vec![json!(selector), json!(text)])
		.await?;
	if !found {
		return Err(Error::ElementNotFound {
			selector: selector.into(),
		});
	}

	if auto_wait {
		if let Err(err) = sync::wait_for_dom_stable(session, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT).await
		{
			debug!(target = "wv", error = %err, "post-type stability wait failed");
		}
	}

	Ok(TypeResult {
		selector: selector.to_string(),
		chars: text.chars().count(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn setter_script_fires_framework_events() {
		assert!(SET_VALUE_JS.contains("getOwnPropertyDescriptor"));
		assert!(SET_VALUE_JS.contains("new Event('input'"));
		assert!(SET_VALUE_JS.contains("new Event('change'"));
	}
}
