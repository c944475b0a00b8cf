mod checksum;
mod info;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pd0::Decoder;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Number of threads used to decode ensembles. Defaults to one per CPU.
    #[arg(short = 'j', long, global = true, value_name = "num")]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a PD0 file.
    Info {
        /// Input PD0 file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,

        /// Verify ensemble checksums while scanning. Decoding stops at the first
        /// ensemble with a bad checksum.
        #[arg(short, long, action)]
        verify_checksums: bool,
    },
    /// Verify the checksum of every ensemble in a PD0 file.
    ///
    /// Unlike `info --verify-checksums` this does not stop at the first bad ensemble;
    /// every ensemble the header scan can frame is checked. Exits non-zero if any
    /// ensemble fails.
    Checksum {
        /// Input PD0 file
        input: PathBuf,
    },
}

fn decoder(threads: Option<usize>, verify_checksums: bool) -> Decoder {
    match threads {
        Some(num) => Decoder::builder()
            .verify_checksums(verify_checksums)
            .num_threads(num)
            .build(),
        None => Decoder::builder().verify_checksums(verify_checksums).build(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("PD0_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Info {
            input,
            format,
            verify_checksums,
        } => info::info(input, format, &decoder(cli.threads, *verify_checksums)),
        Commands::Checksum { input } => checksum::checksum(input, &decoder(cli.threads, false)),
    }
}
