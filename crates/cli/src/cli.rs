//! Command-line surface.
//!
//! One-shot subcommands map 1:1 onto wire [`Command`]s and run
//! connect-execute-disconnect per invocation. `batch`, `serve`, and `cleanup`
//! are front-end modes of their own.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wv_protocol::Command as WireCommand;

use crate::output::OutputFormat;

/// Root CLI for wv.
#[derive(Parser, Debug)]
#[command(name = "wv")]
#[command(about = "Visual testing for desktop WebView apps over a WebDriver bridge")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Target application binary
	#[arg(long, global = true, env = "WV_APP", value_name = "PATH")]
	pub app: Option<PathBuf>,

	/// WebDriver bridge port (the native driver takes the adjacent port)
	#[arg(long, global = true, default_value_t = 4444, value_name = "PORT")]
	pub bridge_port: u16,

	/// Deadline for the interactive-load wait at connect time
	#[arg(long, global = true, default_value_t = 10_000, value_name = "MS")]
	pub connect_timeout: u64,

	/// Disable the automatic waits around DOM-mutating commands
	#[arg(long, global = true)]
	pub no_auto_wait: bool,

	/// Render into a virtual display (Linux)
	#[arg(long, global = true)]
	pub xvfb: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
	/// Click an element
	Click {
		#[arg(value_name = "SELECTOR")]
		selector: String,
	},
	/// Set an input's value
	Type {
		#[arg(value_name = "SELECTOR")]
		selector: String,
		#[arg(value_name = "TEXT")]
		text: String,
	},
	/// Wait for an element to appear (or disappear with --gone)
	Wait {
		#[arg(value_name = "SELECTOR")]
		selector: String,
		/// Deadline in milliseconds
		#[arg(long, value_name = "MS")]
		timeout: Option<u64>,
		/// Wait for the element to disappear instead
		#[arg(long)]
		gone: bool,
	},
	/// Evaluate JavaScript in the application context
	Eval {
		#[arg(value_name = "SCRIPT")]
		script: String,
	},
	/// Capture a screenshot of the rendered window
	Screenshot {
		#[arg(short, long, value_name = "FILE")]
		output: Option<PathBuf>,
		/// Capture the full scroll height, not just the viewport
		#[arg(long)]
		full_page: bool,
	},
	/// Print an accessibility-tree snapshot of the DOM
	Snapshot {
		#[arg(short, long, value_name = "FILE")]
		output: Option<PathBuf>,
	},
	/// Sleep for a fixed delay
	Sleep {
		#[arg(value_name = "MS")]
		ms: u64,
	},
	/// Report connection status
	Status,
	/// Execute a JSON array of commands read from stdin
	Batch,
	/// Run the persistent HTTP command server
	Serve {
		#[arg(short, long, default_value_t = 9222)]
		port: u16,
	},
	/// Kill leftover bridge, driver, and display processes
	Cleanup,
}

impl Commands {
	/// The wire command for one-shot subcommands; `None` for the front-end
	/// modes (batch, serve, cleanup).
	pub fn to_wire(&self) -> Option<WireCommand> {
		match self {
			Commands::Click { selector } => Some(WireCommand::Click {
				selector: selector.clone(),
				auto_wait: None,
			}),
			Commands::Type { selector, text } => Some(WireCommand::Type {
				selector: selector.clone(),
				text: text.clone(),
				auto_wait: None,
			}),
			Commands::Wait {
				selector,
				timeout,
				gone,
			} => Some(WireCommand::Wait {
				selector: selector.clone(),
				timeout: *timeout,
				gone: Some(*gone),
			}),
			Commands::Eval { script } => Some(WireCommand::Eval {
				script: script.clone(),
			}),
			Commands::Screenshot { output, full_page } => Some(WireCommand::Screenshot {
				output: output.clone(),
				full_page: Some(*full_page),
				auto_wait: None,
			}),
			Commands::Snapshot { output } => Some(WireCommand::Snapshot {
				output: output.clone(),
				auto_wait: None,
			}),
			Commands::Sleep { ms } => Some(WireCommand::Sleep { ms: *ms }),
			Commands::Status => Some(WireCommand::Status),
			Commands::Batch | Commands::Serve { .. } | Commands::Cleanup => None,
		}
	}
}
