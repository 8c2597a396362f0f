use anyhow::Context;
use clap::Parser;
use scanreport::cli::{Cli, Commands};
use scanreport::config::AppSettings;
use scanreport::error::ConfigError;
use scanreport::output;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = match AppSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(ConfigError::DirectoryNotFound) => {
            output::print_warning("no configuration directory found, using default settings");
            AppSettings::default()
        }
        Err(err) => return Err(err).context("failed to load settings"),
    };
    debug!(?settings, "resolved settings");

    match &cli.command {
        Commands::Report(cmd) => cmd
            .execute(&settings, cli.quiet)
            .with_context(|| format!("report on {} failed", cmd.scan.display())),
        Commands::Summarize(cmd) => cmd
            .execute(&settings, cli.quiet)
            .with_context(|| format!("summarizing {} failed", cmd.dir.display())),
        Commands::Convert(cmd) => cmd
            .execute(&settings, cli.quiet)
            .with_context(|| format!("converting {} failed", cmd.input.display())),
    }
}
