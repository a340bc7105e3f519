use clap::Parser;
use ephem::cli::{Cli, run_cli};
use ephem::logging::init_logging;
use ephem::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    OutputFormatter::info("Hello! Welcome to ephem, the photo organisation tool.");

    match run_cli(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
