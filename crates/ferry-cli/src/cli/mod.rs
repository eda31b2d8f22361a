//! CLI for the Ferry multipart relay.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use ferry_core::config;

use commands::{run_completions, run_copy, run_man, run_probe};

/// Top-level CLI for the Ferry multipart relay.
#[derive(Debug, Parser)]
#[command(name = "ferry")]
#[command(about = "Ferry: concurrent multipart relay from HTTP sources into object storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Relay one HTTP(S) source into the configured destination bucket.
    Copy {
        /// Direct HTTP/HTTPS URL to read.
        url: String,

        /// Object name; the destination key is the configured upload prefix
        /// joined with this.
        #[arg(long)]
        name: String,

        /// Declared source size in bytes; probed via HEAD when omitted.
        #[arg(long)]
        size: Option<u64>,

        /// Max concurrent in-flight parts (default from config).
        #[arg(long, value_name = "N")]
        queue_size: Option<usize>,

        /// Nominal part size in bytes (default from config).
        #[arg(long, value_name = "BYTES")]
        part_size: Option<u64>,
    },

    /// Probe a source URL: size, ranged-read support, ETag.
    Probe {
        /// Direct HTTP/HTTPS URL to probe.
        url: String,
    },

    /// Generate shell completions on stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate a man page on stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Copy {
                url,
                name,
                size,
                queue_size,
                part_size,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_copy(&cfg, &url, &name, size, queue_size, part_size).await?;
            }
            CliCommand::Probe { url } => run_probe(&url).await?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}
