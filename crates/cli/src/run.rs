//! One-shot and batch front-ends.

use std::io::Read;
use std::time::Duration;

use anyhow::{Context as _, bail};
use wv_protocol::Command;
use wv_runtime::{BridgePorts, KillSignal, kill_by_name};

use crate::cli::{Cli, Commands};
use crate::context::{AppContext, Settings};
use crate::dispatch;
use crate::output::{self, OutputFormat};
use crate::server;

/// Process names the cleanup command sweeps for. Covers the bridge, the
/// per-platform native drivers it spawns, and the virtual display.
const CLEANUP_PATTERNS: &[&str] = &["tauri-driver", "WebKitWebDriver", "msedgedriver", "Xvfb"];

pub async fn run(cli: Cli) -> anyhow::Result<()> {
	let format = cli.format;
	let settings = Settings {
		app: cli.app,
		ports: BridgePorts::new(cli.bridge_port),
		connect_timeout: Duration::from_millis(cli.connect_timeout),
		auto_wait_default: !cli.no_auto_wait,
		use_xvfb: cli.xvfb,
	};
	let mut ctx = AppContext::new(settings);

	match cli.command {
		Commands::Serve { port } => server::serve(ctx, port).await,
		Commands::Batch => run_batch_stdin(ctx, format).await,
		Commands::Cleanup => run_cleanup(&mut ctx).await,
		// Status is answerable without a session; connecting for it would
		// defeat its purpose.
		Commands::Status => {
			let value = dispatch::dispatch(&ctx, Command::Status, false).await?;
			output::print_result(&value, format);
			Ok(())
		}
		other => match other.to_wire() {
			Some(command) => run_one_shot(&mut ctx, command, format).await,
			None => bail!("command has no one-shot form"),
		},
	}
}

/// Connect, execute exactly one command, and disconnect.
async fn run_one_shot(
	ctx: &mut AppContext,
	command: Command,
	format: OutputFormat,
) -> anyhow::Result<()> {
	ctx.ensure_display().await?;
	if let Err(err) = ctx.connect().await {
		ctx.shutdown().await;
		return Err(err);
	}

	let auto_wait_default = ctx.settings.auto_wait_default;
	let result = dispatch::dispatch(ctx, command, auto_wait_default).await;
	ctx.shutdown().await;

	let value = result?;
	output::print_result(&value, format);
	Ok(())
}

/// Connect once, run every command from the stdin JSON array in order, and
/// disconnect. Per-item failures are reported in the output, not as a
/// process failure.
async fn run_batch_stdin(mut ctx: AppContext, format: OutputFormat) -> anyhow::Result<()> {
	let mut input = String::new();
	std::io::stdin()
		.read_to_string(&mut input)
		.context("failed reading batch input from stdin")?;
	let commands: Vec<Command> =
		serde_json::from_str(&input).context("batch input must be a JSON array of commands")?;

	ctx.ensure_display().await?;
	if let Err(err) = ctx.connect().await {
		ctx.shutdown().await;
		return Err(err);
	}

	let auto_wait_default = ctx.settings.auto_wait_default;
	let responses = dispatch::run_batch(&ctx, commands, auto_wait_default).await;
	ctx.shutdown().await;

	output::print_batch(&responses, format);
	Ok(())
}

/// Best-effort sweep of processes left behind by crashed runs.
async fn run_cleanup(ctx: &mut AppContext) -> anyhow::Result<()> {
	ctx.shutdown().await;
	let killed = kill_by_name(CLEANUP_PATTERNS, KillSignal::Kill);
	println!("cleaned up {killed} leftover processes");
	Ok(())
}
