use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use exe_diagnostics::Diagnostics;
use exe_driver::Driver;
use log::info;

pub mod cli;

fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .try_init()?;

    let mut diag = Diagnostics::new();
    match Driver::run(&args.build_options(), &mut diag) {
        Ok(path) => {
            info!("Image written to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(()) => Ok(ExitCode::FAILURE),
    }
}
