//! Command-line parsing and the subcommand-to-wire mapping.

use clap::Parser;
use wv_cli::cli::{Cli, Commands};
use wv_protocol::Command;

#[test]
fn click_takes_a_positional_selector() {
	let cli = Cli::try_parse_from(["wv", "click", "#submit", "--app", "/tmp/demo"]).unwrap();
	assert_eq!(cli.app.as_deref(), Some(std::path::Path::new("/tmp/demo")));
	let Commands::Click { selector } = &cli.command else {
		panic!("expected click");
	};
	assert_eq!(selector, "#submit");
	assert_eq!(
		cli.command.to_wire(),
		Some(Command::Click {
			selector: "#submit".into(),
			auto_wait: None,
		})
	);
}

#[test]
fn wait_supports_timeout_and_gone() {
	let cli =
		Cli::try_parse_from(["wv", "wait", ".spinner", "--gone", "--timeout", "3000"]).unwrap();
	assert_eq!(
		cli.command.to_wire(),
		Some(Command::Wait {
			selector: ".spinner".into(),
			timeout: Some(3000),
			gone: Some(true),
		})
	);
}

#[test]
fn serve_defaults_to_port_9222() {
	let cli = Cli::try_parse_from(["wv", "serve"]).unwrap();
	let Commands::Serve { port } = cli.command else {
		panic!("expected serve");
	};
	assert_eq!(port, 9222);
}

#[test]
fn front_end_modes_have_no_wire_form() {
	for args in [vec!["wv", "batch"], vec!["wv", "serve"], vec!["wv", "cleanup"]] {
		let cli = Cli::try_parse_from(args).unwrap();
		assert_eq!(cli.command.to_wire(), None);
	}
}

#[test]
fn global_flags_apply_after_the_subcommand() {
	let cli = Cli::try_parse_from([
		"wv",
		"screenshot",
		"--no-auto-wait",
		"--xvfb",
		"--bridge-port",
		"4544",
		"-vv",
	])
	.unwrap();
	assert!(cli.no_auto_wait);
	assert!(cli.xvfb);
	assert_eq!(cli.bridge_port, 4544);
	assert_eq!(cli.verbose, 2);
}

#[test]
fn screenshot_flags_map_to_the_wire() {
	let cli =
		Cli::try_parse_from(["wv", "screenshot", "-o", "shot.png", "--full-page"]).unwrap();
	assert_eq!(
		cli.command.to_wire(),
		Some(Command::Screenshot {
			output: Some("shot.png".into()),
			full_page: Some(true),
			auto_wait: None,
		})
	);
}

#[test]
fn missing_required_arguments_fail_parsing() {
	assert!(Cli::try_parse_from(["wv", "click"]).is_err());
	assert!(Cli::try_parse_from(["wv", "type", "#field"]).is_err());
	assert!(Cli::try_parse_from(["wv"]).is_err());
}
