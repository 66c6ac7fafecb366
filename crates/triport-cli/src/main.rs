mod completion;
mod dispatch;
mod presenter;
mod remove_flow;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "triport")]
#[command(about = "Track and remove installed ports per target triplet", long_about = None)]
struct Cli {
    /// Root holding installed/, packages/, ports/ and state/.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Triplet for package arguments given without one.
    #[arg(long, global = true)]
    triplet: Option<String>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remove packages and, with --recurse, everything that depends on them.
    Remove {
        specs: Vec<String>,
        /// Also delete the package staging directories (default).
        #[arg(long)]
        purge: bool,
        /// Keep the package staging directories.
        #[arg(long)]
        no_purge: bool,
        /// Allow removing packages that depend on the requested ones.
        #[arg(long)]
        recurse: bool,
        /// Print the plan without changing anything.
        #[arg(long)]
        dry_run: bool,
        /// Target every installed package whose port has a newer version.
        #[arg(long)]
        outdated: bool,
    },
    /// List installed packages.
    List,
    Doctor,
    Completions {
        shell: Shell,
    },
}

fn init_tracing(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("TRIPORT_LOG")
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    dispatch::run_cli(cli)
}
