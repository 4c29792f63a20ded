//! Snapshot command: live DOM to accessibility listing.

use std::path::Path;

use serde_json::json;
use tracing::{debug, info};
use wv_protocol::SnapshotResult;

use crate::a11y::{AccessibilityNode, MAX_SNAPSHOT_DEPTH, RawNode};
use crate::error::Result;
use crate::session::Session;
use crate::sync::{self, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT};

/// Depth-capped walk of the body subtree. Script/style and friends are
/// filtered here so their contents never even cross the wire; semantic
/// filtering and pruning happen on the Rust side.
const SNAPSHOT_JS: &str = r#"
const maxDepth = arguments[0];
const SKIP = { SCRIPT: 1, STYLE: 1, NOSCRIPT: 1, TEMPLATE: 1, META: 1, LINK: 1, TITLE: 1, HEAD: 1 };

function directText(el) {
	let text = '';
	for (const node of el.childNodes) {
		if (node.nodeType === Node.TEXT_NODE) text += node.textContent;
	}
	text = text.replace(/\s+/g, ' ').trim();
	return text || null;
}

function walk(el, depth) {
	if (depth > maxDepth || SKIP[el.tagName]) return null;
	const attrs = {};
	for (const key of ['id', 'class', 'type', 'role', 'aria-label', 'placeholder', 'title', 'alt']) {
		const value = el.getAttribute(key);
		if (value) attrs[key] = value;
	}
	if (el.disabled) attrs.disabled = 'true';
	if (el.checked) attrs.checked = 'true';
	const children = [];
	for (const child of el.children) {
		const node = walk(child, depth + 1);
		if (node) children.push(node);
	}
	return { tag: el.tagName.toLowerCase(), text: directText(el), attrs: attrs, children: children };
}

return walk(document.body || document.documentElement, 0);
"#;

/// Build the accessibility listing for the current page.
pub async fn snapshot(
	session: &Session,
	output: Option<&Path>,
	auto_wait: bool,
) -> Result<SnapshotResult> {
	info!(target = "wv", auto_wait, "snapshot");

	if auto_wait {
		if let Err(err) = sync::wait_for_dom_stable(session, DOM_STABLE_SETTLE, DOM_STABLE_TIMEOUT).await
		{
			debug!(target = "wv", error = %err, "pre-snapshot stability wait failed");
		}
	}

	let value = session
		.eval_value(SNAPSHOT_JS, vec![json!(MAX_SNAPSHOT_DEPTH)])
		.await?;

	let tree = if value.is_null() {
		String::new()
	} else {
		let raw: RawNode = serde_json::from_value(value)?;
		AccessibilityNode::from_raw(raw).map(|node| node.render()).unwrap_or_default()
	};

	let path = match output {
		Some(path) => {
			std::fs::write(path, &tree)?;
			Some(path.to_path_buf())
		}
		None => None,
	};

	Ok(SnapshotResult { tree, path })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn walk_filters_scripts_at_the_source() {
		assert!(SNAPSHOT_JS.contains("SCRIPT: 1"));
		assert!(SNAPSHOT_JS.contains("STYLE: 1"));
		assert!(SNAPSHOT_JS.contains("maxDepth"));
	}

	#[test]
	fn extraction_shape_deserializes_into_raw_node() {
		let payload = serde_json::json!({
			"tag": "body",
			"text": null,
			"attrs": {},
			"children": [
				{ "tag": "button", "text": "Go", "attrs": { "id": "go" }, "children": [] }
			]
		});
		let raw: RawNode = serde_json::from_value(payload).unwrap();
		let rendered = AccessibilityNode::from_raw(raw).unwrap().render();
		assert_eq!(rendered, "- generic\n  - button \"Go\" #go\n");
	}
}
