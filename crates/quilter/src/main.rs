mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command};
use libquilter_core::Config;
use libquilter_git::GitError;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run_command(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(cli: &Cli) -> Result<(), GitError> {
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Refresh { repo, clear } => {
            commands::refresh::run(&config, repo.as_deref(), *clear)
        }
        Command::Report { repo } => commands::report::run(&config, repo),
        Command::Activity { repo, since } => {
            commands::activity::run(&config, repo, since.as_deref())
        }
        Command::Cache { cmd } => commands::cache::run(&config, cmd),
    }
}
