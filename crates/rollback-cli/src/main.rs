mod error;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "rollback-dirs")]
#[command(bin_name = "rollback-dirs")]
#[command(about = "Create a directory of files, undoing everything if a step fails", long_about = None)]
struct Cli {
    /// Directory to create
    dir: PathBuf,

    /// TOML plan listing the files to insert and the renames to apply
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Add a failing step after the renames to exercise the rollback
    #[arg(long)]
    fail_after_rename: bool,

    /// Roll the procedure back after it completes
    #[arg(long)]
    rollback: bool,

    /// Print the actions log as JSON
    #[arg(long)]
    json: bool,

    /// Log filter directive, e.g. `debug` or `rollback_procedure=trace`
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let options = run::RunOptions {
        dir: cli.dir,
        plan: cli.plan,
        fail_after_rename: cli.fail_after_rename,
        rollback: cli.rollback,
        json: cli.json,
    };

    match run::execute(&options) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
