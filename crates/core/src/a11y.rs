//! Accessibility-tree model for snapshots.
//!
//! The in-page extraction script produces a raw DOM tree ([`RawNode`]);
//! conversion to [`AccessibilityNode`] resolves roles and accessible names
//! and prunes nodes that carry no information. Rendering produces the
//! indented line-oriented listing the snapshot command emits:
//!
//! ```text
//! - generic
//!   - button "Submit" #submit .btn.primary
//!   - textbox type=password #pw
//!   - listitem: "First entry"
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

/// Recursion cap for the in-page walk; malformed trees stop here instead of
/// blowing the stack.
pub const MAX_SNAPSHOT_DEPTH: u32 = 60;

const TEXT_TRUNCATE: usize = 80;
const MAX_CLASS_MARKERS: usize = 2;

/// Tags dropped wholesale, along with their subtrees.
const IGNORED_TAGS: &[&str] = &[
	"script", "style", "noscript", "template", "meta", "link", "title", "head",
];

/// Tags that stay in the listing even with no name, text, or children.
const INTRINSIC_TAGS: &[&str] = &[
	"input", "img", "button", "select", "textarea", "hr", "br", "video", "audio", "canvas",
	"iframe",
];

/// Roles whose accessible name falls back to their direct text.
const NAMED_FROM_TEXT: &[&str] = &["button", "link", "heading", "label", "listitem"];

/// Raw DOM node shape produced by the in-page extraction script.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
	pub tag: String,
	#[serde(default)]
	pub text: Option<String>,
	#[serde(default)]
	pub attrs: BTreeMap<String, String>,
	#[serde(default)]
	pub children: Vec<RawNode>,
}

/// One node of the rendered accessibility tree. Built fresh per snapshot,
/// never persisted.
#[derive(Debug, Clone)]
pub struct AccessibilityNode {
	pub role: String,
	pub name: Option<String>,
	pub text: Option<String>,
	/// Filtered attributes that become inline markers: id, class, type,
	/// disabled, checked.
	pub attrs: BTreeMap<String, String>,
	pub children: Vec<AccessibilityNode>,
}

impl AccessibilityNode {
	/// Convert a raw DOM node; `None` means the node (and its subtree, when
	/// empty) was pruned.
	pub fn from_raw(raw: RawNode) -> Option<Self> {
		let tag = raw.tag.to_ascii_lowercase();
		if IGNORED_TAGS.contains(&tag.as_str()) {
			return None;
		}

		let children: Vec<AccessibilityNode> =
			raw.children.into_iter().filter_map(Self::from_raw).collect();

		let role = resolve_role(&tag, &raw.attrs);
		let text = raw.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
		let name = resolve_name(&raw.attrs, text.as_deref(), &role);

		// When the direct text became the accessible name, showing it twice
		// is noise.
		let text = match (&name, text) {
			(Some(name), Some(text)) if *name == text => None,
			(_, text) => text,
		};

		let node = Self {
			role,
			name,
			text,
			attrs: filter_attrs(raw.attrs),
			children,
		};

		let intrinsic = INTRINSIC_TAGS.contains(&tag.as_str());
		if !intrinsic && node.name.is_none() && node.text.is_none() && node.children.is_empty() {
			return None;
		}
		Some(node)
	}

	/// Render the indented listing, one element per line, children two spaces
	/// deeper than their parent.
	pub fn render(&self) -> String {
		let mut out = String::new();
		self.render_into(&mut out, 0);
		out
	}

	fn render_into(&self, out: &mut String, depth: usize) {
		for _ in 0..depth {
			out.push_str("  ");
		}
		out.push_str("- ");
		out.push_str(&self.role);

		if let Some(name) = &self.name {
			out.push_str(&format!(" \"{}\"", escape(truncate(name))));
		}
		for marker in self.markers() {
			out.push(' ');
			out.push_str(&marker);
		}
		if let Some(text) = &self.text {
			out.push_str(&format!(": \"{}\"", escape(truncate(text))));
		}
		out.push('\n');

		for child in &self.children {
			child.render_into(out, depth + 1);
		}
	}

	fn markers(&self) -> Vec<String> {
		let mut markers = Vec::new();
		if let Some(id) = self.attrs.get("id") {
			markers.push(format!("#{id}"));
		}
		if let Some(class) = self.attrs.get("class") {
			let classes: Vec<&str> = class.split_whitespace().take(MAX_CLASS_MARKERS).collect();
			if !classes.is_empty() {
				markers.push(format!(".{}", classes.join(".")));
			}
		}
		if let Some(ty) = self.attrs.get("type") {
			markers.push(format!("type={ty}"));
		}
		if self.attrs.contains_key("disabled") {
			markers.push("disabled".into());
		}
		if self.attrs.contains_key("checked") {
			markers.push("checked".into());
		}
		markers
	}
}

fn resolve_role(tag: &str, attrs: &BTreeMap<String, String>) -> String {
	if let Some(role) = attrs.get("role") {
		return role.clone();
	}
	let role = match tag {
		"a" => "link",
		"button" => "button",
		"input" => match attrs.get("type").map(String::as_str) {
			Some("submit") | Some("button") => "button",
			Some("checkbox") => "checkbox",
			Some("radio") => "radio",
			Some("range") => "slider",
			_ => "textbox",
		},
		"textarea" => "textbox",
		"select" => "combobox",
		"img" => "image",
		"h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
		"nav" => "navigation",
		"main" => "main",
		"header" => "banner",
		"footer" => "contentinfo",
		"ul" | "ol" => "list",
		"li" => "listitem",
		"table" => "table",
		"form" => "form",
		"label" => "label",
		"p" => "paragraph",
		_ => "generic",
	};
	role.to_string()
}

fn resolve_name(
	attrs: &BTreeMap<String, String>,
	text: Option<&str>,
	role: &str,
) -> Option<String> {
	for key in ["aria-label", "placeholder", "title", "alt"] {
		if let Some(value) = attrs.get(key) {
			if !value.trim().is_empty() {
				return Some(value.trim().to_string());
			}
		}
	}
	if NAMED_FROM_TEXT.contains(&role) {
		return text.map(str::to_string).filter(|t| !t.is_empty());
	}
	None
}

fn filter_attrs(mut attrs: BTreeMap<String, String>) -> BTreeMap<String, String> {
	attrs.retain(|key, _| matches!(key.as_str(), "id" | "class" | "type" | "disabled" | "checked"));
	attrs
}

fn truncate(text: &str) -> String {
	if text.chars().count() <= TEXT_TRUNCATE {
		return text.to_string();
	}
	let mut out: String = text.chars().take(TEXT_TRUNCATE).collect();
	out.push_str("...");
	out
}

fn escape(text: String) -> String {
	text.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw(tag: &str) -> RawNode {
		RawNode {
			tag: tag.into(),
			..Default::default()
		}
	}

	fn with_attr(mut node: RawNode, key: &str, value: &str) -> RawNode {
		node.attrs.insert(key.into(), value.into());
		node
	}

	fn with_text(mut node: RawNode, text: &str) -> RawNode {
		node.text = Some(text.into());
		node
	}

	#[test]
	fn script_and_style_never_appear() {
		assert!(AccessibilityNode::from_raw(raw("script")).is_none());
		assert!(AccessibilityNode::from_raw(raw("style")).is_none());

		let mut body = raw("body");
		body.children = vec![raw("script"), with_text(raw("p"), "hello")];
		let node = AccessibilityNode::from_raw(body).unwrap();
		assert_eq!(node.children.len(), 1);
		assert!(!node.render().contains("script"));
	}

	#[test]
	fn empty_div_is_pruned_but_input_is_kept() {
		assert!(AccessibilityNode::from_raw(raw("div")).is_none());
		assert!(AccessibilityNode::from_raw(raw("input")).is_some());
	}

	#[test]
	fn pruning_cascades_through_empty_wrappers() {
		let mut outer = raw("div");
		let mut inner = raw("div");
		inner.children = vec![raw("span")];
		outer.children = vec![inner];
		assert!(AccessibilityNode::from_raw(outer).is_none());
	}

	#[test]
	fn role_comes_from_tag_type_and_override() {
		let checkbox = with_attr(raw("input"), "type", "checkbox");
		assert_eq!(AccessibilityNode::from_raw(checkbox).unwrap().role, "checkbox");

		let submit = with_attr(raw("input"), "type", "submit");
		assert_eq!(AccessibilityNode::from_raw(submit).unwrap().role, "button");

		let custom = with_attr(with_text(raw("div"), "x"), "role", "tab");
		assert_eq!(AccessibilityNode::from_raw(custom).unwrap().role, "tab");
	}

	#[test]
	fn button_text_becomes_its_name() {
		let button = with_text(raw("button"), "Submit");
		let node = AccessibilityNode::from_raw(button).unwrap();
		assert_eq!(node.name.as_deref(), Some("Submit"));
		assert_eq!(node.text, None);
		assert_eq!(node.render(), "- button \"Submit\"\n");
	}

	#[test]
	fn aria_label_wins_over_text() {
		let button = with_attr(with_text(raw("button"), "X"), "aria-label", "Close dialog");
		let node = AccessibilityNode::from_raw(button).unwrap();
		assert_eq!(node.name.as_deref(), Some("Close dialog"));
		assert_eq!(node.text.as_deref(), Some("X"));
	}

	#[test]
	fn markers_render_in_order() {
		let mut input = raw("input");
		input.attrs.insert("id".into(), "pw".into());
		input.attrs.insert("class".into(), "field dark wide extra".into());
		input.attrs.insert("type".into(), "password".into());
		input.attrs.insert("disabled".into(), "true".into());
		let node = AccessibilityNode::from_raw(input).unwrap();
		assert_eq!(node.render(), "- textbox #pw .field.dark type=password disabled\n");
	}

	#[test]
	fn children_indent_two_spaces_per_level() {
		let mut list = raw("ul");
		list.children = vec![with_text(raw("li"), "First"), with_text(raw("li"), "Second")];
		let mut body = raw("body");
		body.children = vec![list];
		let rendered = AccessibilityNode::from_raw(body).unwrap().render();
		assert_eq!(
			rendered,
			"- generic\n  - list\n    - listitem \"First\"\n    - listitem \"Second\"\n"
		);
	}

	#[test]
	fn long_text_is_truncated() {
		let long = "x".repeat(200);
		let node = AccessibilityNode::from_raw(with_text(raw("p"), &long)).unwrap();
		let rendered = node.render();
		assert!(rendered.contains("..."));
		assert!(rendered.len() < 120);
	}

	#[test]
	fn quotes_are_escaped() {
		let node = AccessibilityNode::from_raw(with_text(raw("p"), "say \"hi\"")).unwrap();
		assert_eq!(node.render(), "- paragraph: \"say \\\"hi\\\"\"\n");
	}
}
