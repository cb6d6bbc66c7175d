//! CLI for the costrep monthly cost report.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use costrep_core::config;

use commands::{run_report, show_config};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "costrep")]
#[command(about = "costrep: monthly cloud cost report per subscription", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Build the report for the previous calendar month and deliver it.
    Run {
        /// Collect costs but do not upload the report.
        #[arg(long)]
        no_deliver: bool,
        /// Also write the CSV report to stdout.
        #[arg(long)]
        print: bool,
    },

    /// Show the config file path and the effective configuration (secrets masked).
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg.redacted());

        match cli.command {
            CliCommand::Run { no_deliver, print } => run_report(cfg, !no_deliver, print).await?,
            CliCommand::Config => show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
