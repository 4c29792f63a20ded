use clap::Parser;
use wv_cli::{cli::Cli, logging, output, run};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	if let Err(err) = run::run(cli).await {
		output::print_error(&format!("{err:#}"), format);
		std::process::exit(1);
	}
}
