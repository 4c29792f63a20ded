//! Dispatch and batch behavior that must hold without any bridge running:
//! precondition errors, per-item failure isolation, status reporting.

use std::time::Duration;

use wv_cli::context::{AppContext, Settings};
use wv_cli::dispatch::{dispatch, run_batch};
use wv_protocol::Command;
use wv_runtime::BridgePorts;

fn idle_context() -> AppContext {
	AppContext::new(Settings {
		app: None,
		ports: BridgePorts::default(),
		connect_timeout: Duration::from_secs(1),
		auto_wait_default: true,
		use_xvfb: false,
	})
}

#[tokio::test]
async fn batch_isolates_per_item_failures() {
	let ctx = idle_context();
	let commands = vec![
		Command::Sleep { ms: 5 },
		Command::Click {
			selector: "#missing-xyz".into(),
			auto_wait: None,
		},
		Command::Status,
	];

	let responses = run_batch(&ctx, commands, true).await;

	assert_eq!(responses.len(), 3, "every item must yield exactly one response");
	assert!(responses[0].success);
	assert!(!responses[1].success);
	assert!(
		responses[1]
			.error
			.as_deref()
			.unwrap_or_default()
			.contains("not connected")
	);
	assert!(responses[2].success, "failure must not abort the remaining items");
}

#[tokio::test]
async fn session_commands_need_a_connection() {
	let ctx = idle_context();
	let needs_session = vec![
		Command::Click {
			selector: "#a".into(),
			auto_wait: None,
		},
		Command::Type {
			selector: "#a".into(),
			text: "hi".into(),
			auto_wait: None,
		},
		Command::Wait {
			selector: "#a".into(),
			timeout: Some(10),
			gone: None,
		},
		Command::Eval {
			script: "1 + 1".into(),
		},
		Command::Screenshot {
			output: None,
			full_page: None,
			auto_wait: None,
		},
		Command::Snapshot {
			output: None,
			auto_wait: None,
		},
	];

	for command in needs_session {
		let name = command.name();
		let err = dispatch(&ctx, command, false).await.unwrap_err();
		assert!(
			err.to_string().contains("not connected"),
			"{name} should fail the precondition, got: {err}"
		);
	}
}

#[tokio::test]
async fn status_and_sleep_work_without_a_session() {
	let ctx = idle_context();

	let status = dispatch(&ctx, Command::Status, false).await.unwrap();
	assert_eq!(status["connected"], false);
	assert_eq!(status["bridgePort"], 4444);

	let slept = dispatch(&ctx, Command::Sleep { ms: 1 }, false).await.unwrap();
	assert_eq!(slept["sleptMs"], 1);
}

#[tokio::test]
async fn empty_batch_yields_empty_results() {
	let ctx = idle_context();
	assert!(run_batch(&ctx, Vec::new(), false).await.is_empty());
}
