//! Boardrefs -- a chess board coordination layer driven by text commands.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//! Logs go to stderr.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use boardrefs::config::load_settings;
use boardrefs::protocol::parser::parse_command;
use boardrefs::session::Session;

#[derive(Parser, Debug)]
#[command(name = "boardrefs", version, about)]
struct Cli {
    /// Settings file; defaults to ./boardrefs.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Starting position in FEN.
    #[arg(long)]
    fen: Option<String>,
    /// Seed for random move selection.
    #[arg(long)]
    seed: Option<u64>,
}

/// Runs the command loop, reading commands from stdin and writing
/// responses to stdout.
fn main() {
    let cli = Cli::parse();

    let mut settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("boardrefs: {}", e);
            process::exit(2);
        }
    };
    if let Some(fen) = cli.fen {
        settings.start_fen = Some(fen);
    }
    if let Some(seed) = cli.seed {
        settings.seed = Some(seed);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut session = Session::new(settings);

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match session.handle(cmd, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                eprintln!("boardrefs: write failed: {}", e);
                break;
            }
        }
    }
}
