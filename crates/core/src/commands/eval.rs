//! Eval command.
//!
//! Scripts arrive in two flavors: bare expressions (`document.title`) and
//! statement blocks (`const x = ...; return x;`). WebDriver's execute wraps
//! the script in a function body, so an expression needs an explicit
//! `return (...)` wrapper while a statement block must run verbatim. The
//! handler attempts the expression form first and falls back to the
//! statement form, keeping both failures when neither parses.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::session::Session;

/// Evaluate user JavaScript in the application context.
pub async fn eval(session: &Session, script: &str) -> Result<serde_json::Value> {
	info!(target = "wv", bytes = script.len(), "eval");

	let expr_err = match session.eval_value(&expression_form(script), vec![]).await {
		Ok(value) => return Ok(value),
		Err(err) => err,
	};

	debug!(target = "wv", error = %expr_err, "expression form rejected, retrying as statement block");
	match session.eval_value(script, vec![]).await {
		Ok(value) => Ok(value),
		Err(stmt_err) => Err(Error::Eval(format!(
			"expression form: {expr_err}; statement form: {stmt_err}"
		))),
	}
}

/// Wrap a script so a bare expression becomes the return value. A leading
/// `return` and trailing semicolons are tolerated so the common
/// `return document.title` spelling hits the fast path.
fn expression_form(script: &str) -> String {
	let trimmed = script.trim().trim_end_matches(';').trim_end();
	let body = trimmed.strip_prefix("return ").unwrap_or(trimmed);
	format!("return ({body});")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bare_expression_is_wrapped() {
		assert_eq!(expression_form("document.title"), "return (document.title);");
	}

	#[test]
	fn explicit_return_is_absorbed() {
		assert_eq!(
			expression_form("return document.title"),
			"return (document.title);"
		);
		assert_eq!(
			expression_form("  return document.title;  "),
			"return (document.title);"
		);
	}

	#[test]
	fn statement_block_survives_wrapping_attempt() {
		// Produces a syntax error in the expression form, which is exactly
		// what triggers the statement fallback.
		let wrapped = expression_form("const x = 1; return x");
		assert!(wrapped.starts_with("return ("));
	}
}
