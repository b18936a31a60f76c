mod app;

use std::env;
use std::process::ExitCode;

use tracing::error;

use app::bootstrap::{self, CliCommand};
use app::loop_runner;

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let config = match bootstrap::parse_args(&args) {
        Ok(CliCommand::Run(config)) => config,
        Ok(CliCommand::Help) => {
            println!("{}", bootstrap::usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", bootstrap::usage_text());
            return ExitCode::from(2);
        }
    };

    bootstrap::init_tracing();
    match bootstrap::build_app(config) {
        Ok(app) => loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
