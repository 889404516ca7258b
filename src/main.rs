// src/main.rs
//
// reassemblahtml — HTML-ish tag line reassembler
//
// - Reads an input file line by line, trimming each line.
// - Lines mentioning "embed" are counted with the embed tokens
//   ("<emb" / "/><emb"); everything else with the standard tokens ("<" / "</").
// - An unbalanced line is held and prepended to the next line before recounting;
//   at most one fragment is ever held.
// - Balanced standard groups are written out as-is; complete embed groups are
//   split so every embed tag lands on its own line.
// - Output goes to a freshly created file named "<YYYY-MM-DD HH-MM-SS> <base>";
//   an existing file of that name is never overwritten.
// - Per-line decisions go to the debug log (RUST_LOG=reassemblahtml=debug).
//
// CLI flags:
//   --output <base> : base name for the cleaned file
//   --no-pause      : exit without waiting for a keypress

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reassemblahtml::outfile::{timestamped_name, write_cleaned};
use reassemblahtml::reassemble::Reassembler;

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Input file
    #[arg(default_value = "Music Webpage.txt")]
    input: PathBuf,

    /// Base name for the cleaned file (the run timestamp is prepended)
    #[arg(long, short, default_value = "Music Page.txt")]
    output: String,

    /// Exit without waiting for a keypress
    #[arg(long = "no-pause", action = ArgAction::SetTrue)]
    no_pause: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reassemblahtml=info")),
        )
        .with_writer(io::stderr)
        .init();

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("could not read input file {}", cli.input.display()))?;

    let mut reassembler = Reassembler::new();
    for line in text.lines() {
        reassembler.push_line(line);
    }
    let cleaned = reassembler.finish();

    let out_path = PathBuf::from(timestamped_name(Local::now(), &cli.output));
    write_cleaned(&out_path, &cleaned)?;
    info!(
        lines = cleaned.len(),
        output = %out_path.display(),
        "wrote cleaned file"
    );

    if !cli.no_pause {
        pause_for_exit();
    }
    Ok(())
}

/// Hold the console open until the user presses a key.
fn pause_for_exit() {
    println!("\nPress any key to exit...");
    let mut byte = [0u8];
    let _ = io::stdin().read(&mut byte);
}
