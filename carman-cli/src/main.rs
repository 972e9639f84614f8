//! CARMAN CLI - the compressed archive manager
//!
//! Maintains CAR archives: flat, checksummed collections of files, each stored
//! or LZSS-compressed.

mod commands;
mod utils;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use commands::{Decode, Rewrite, cmd_decode, cmd_list, cmd_rewrite};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carman")]
#[command(
    author,
    version,
    about = "Compressed archive manager with an embedded LZSS codec"
)]
#[command(long_about = "
CARMAN maintains CAR archives. Every entry carries a CRC-32 of its header and
of its data, and is stored LZSS-compressed unless that would not save space.

A missing .car extension is added to archive names that do not exist.
Patterns accept * and ? wildcards; no patterns means every entry.

Examples:
  carman add backup notes.txt src/main.c
  carman list backup
  carman list backup '*.txt' --json
  carman extract backup -o restored
  carman replace backup '*.c' -C src
  carman delete backup notes.txt
  carman print backup readme.txt
  carman test backup
")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Do not show the progress spinner
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add files to an archive, creating it if needed
    #[command(alias = "a")]
    Add {
        /// Archive file
        archive: PathBuf,

        /// Files to add; entries with the same name are superseded
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract entries into a directory
    #[command(alias = "x")]
    Extract {
        /// Archive file
        archive: PathBuf,

        /// Entry name patterns
        patterns: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Recompress entries from files of the same name
    #[command(alias = "r")]
    Replace {
        /// Archive file
        archive: PathBuf,

        /// Entry name patterns
        patterns: Vec<String>,

        /// Directory holding the replacement files
        #[arg(short = 'C', long = "directory", default_value = ".")]
        directory: PathBuf,
    },

    /// Delete entries from an archive
    #[command(alias = "d")]
    Delete {
        /// Archive file
        archive: PathBuf,

        /// Entry name patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Write entry contents to standard output
    #[command(alias = "p")]
    Print {
        /// Archive file
        archive: PathBuf,

        /// Entry name patterns
        patterns: Vec<String>,
    },

    /// List archive contents
    #[command(alias = "l")]
    List {
        /// Archive file
        archive: PathBuf,

        /// Entry name patterns
        patterns: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify entry checksums without writing anything
    #[command(alias = "t")]
    Test {
        /// Archive file
        archive: PathBuf,

        /// Entry name patterns
        patterns: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let progress = !cli.no_progress;

    let result = match cli.command {
        Commands::Add { archive, files } => {
            cmd_rewrite(&archive, Rewrite::Add(&files), &[], progress)
        }
        Commands::Replace {
            archive,
            patterns,
            directory,
        } => cmd_rewrite(&archive, Rewrite::Replace(&directory), &patterns, progress),
        Commands::Delete { archive, patterns } => {
            cmd_rewrite(&archive, Rewrite::Delete, &patterns, progress)
        }
        Commands::Extract {
            archive,
            patterns,
            output,
        } => cmd_decode(&archive, Decode::Extract(&output), &patterns, progress),
        Commands::Print { archive, patterns } => {
            cmd_decode(&archive, Decode::Print, &patterns, progress)
        }
        Commands::Test { archive, patterns } => {
            cmd_decode(&archive, Decode::Test, &patterns, progress)
        }
        Commands::List {
            archive,
            patterns,
            json,
        } => cmd_list(&archive, &patterns, json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
