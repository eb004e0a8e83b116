//! tabclass - Main Entry Point
//!
//! Tabular cleaning and logistic-regression classification from the command line.

use clap::{CommandFactory, Parser};
use tabclass::cli::{cmd_preprocess, cmd_train, Cli, Commands, LogFormat};
use tabclass::config::Settings;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "tabclass=info".into());
    match cli.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let Some(command) = cli.command else {
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(2);
    };

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let result = match command {
        Commands::Preprocess => cmd_preprocess(&settings),
        Commands::Train => cmd_train(&settings),
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, "Run failed");
    }
    result
}
