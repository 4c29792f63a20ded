//! Unified command dispatch for the one-shot, batch, and server front-ends.

use serde_json::Value;
use tracing::debug;
use wv::{Result, commands};
use wv_protocol::{Command, CommandResponse, SleepResult, StatusResult};

use crate::context::AppContext;

/// Execute one command against the context.
///
/// The match is exhaustive over the closed [`Command`] enum: adding a variant
/// without a handler is a compile error, not a runtime default case. Missing
/// required fields never get this far; they fail at deserialization.
///
/// autoWait resolution: the per-command override wins, then the front-end's
/// default (`auto_wait_default`).
pub async fn dispatch(
	ctx: &AppContext,
	command: Command,
	auto_wait_default: bool,
) -> Result<Value> {
	let auto_wait = command.auto_wait().unwrap_or(auto_wait_default);

	match command {
		Command::Click { selector, .. } => {
			let session = ctx.supervisor.require_session()?;
			let result = commands::click(session, &selector, auto_wait).await?;
			Ok(serde_json::to_value(result)?)
		}
		Command::Type { selector, text, .. } => {
			let session = ctx.supervisor.require_session()?;
			let result = commands::type_text(session, &selector, &text, auto_wait).await?;
			Ok(serde_json::to_value(result)?)
		}
		Command::Wait {
			selector,
			timeout,
			gone,
		} => {
			let session = ctx.supervisor.require_session()?;
			let result =
				commands::wait_for(session, &selector, timeout, gone.unwrap_or(false)).await?;
			Ok(serde_json::to_value(result)?)
		}
		Command::Eval { script } => {
			let session = ctx.supervisor.require_session()?;
			commands::eval(session, &script).await
		}
		Command::Screenshot {
			output, full_page, ..
		} => {
			let session = ctx.supervisor.require_session()?;
			let result = commands::screenshot(
				session,
				ctx.display_name().as_deref(),
				output.as_deref(),
				full_page.unwrap_or(false),
				auto_wait,
			)
			.await?;
			Ok(serde_json::to_value(result)?)
		}
		Command::Snapshot { output, .. } => {
			let session = ctx.supervisor.require_session()?;
			let result = commands::snapshot(session, output.as_deref(), auto_wait).await?;
			Ok(serde_json::to_value(result)?)
		}
		Command::Sleep { ms } => {
			tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
			Ok(serde_json::to_value(SleepResult { slept_ms: ms })?)
		}
		Command::Status => {
			let result = StatusResult {
				connected: ctx.supervisor.is_connected(),
				bridge_port: ctx.settings.ports.port,
				app: ctx.settings.app.clone(),
			};
			Ok(serde_json::to_value(result)?)
		}
	}
}

/// Execute an ordered batch, isolating per-item failures.
///
/// Command k failing never prevents k+1..N from running, and every item
/// yields exactly one tagged response, so a partial batch stays diagnosable.
pub async fn run_batch(
	ctx: &AppContext,
	commands: Vec<Command>,
	auto_wait_default: bool,
) -> Vec<CommandResponse> {
	let mut responses = Vec::with_capacity(commands.len());
	for command in commands {
		let name = command.name();
		match dispatch(ctx, command, auto_wait_default).await {
			Ok(value) => responses.push(CommandResponse::ok(value)),
			Err(err) => {
				debug!(target = "wv", command = name, error = %err, "batch item failed");
				responses.push(CommandResponse::err(err.to_string()));
			}
		}
	}
	responses
}
