use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

mod check;
mod config;
mod export;
mod list;
mod lookup;
mod source;

#[derive(Parser)]
#[command(name = "doxsearch")]
#[command(about = "Query Doxygen search indexes from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    /// Use this doxsearch.toml instead of searching parent directories for one
    #[arg(short = 'C', long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find entries whose key starts with a prefix
    #[command(alias = "l")]
    Lookup(lookup::LookupArgs),

    /// List every key of an index
    #[command(alias = "ls")]
    List(list::ListArgs),

    /// Validate index files and search directories
    Check(check::CheckArgs),

    /// Write an index back out as Doxygen JavaScript or JSON
    Export(export::ExportArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --debug raises the default level; RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = config::Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Lookup(args) => lookup::execute(args, &config),
        Commands::List(args) => list::execute(args, &config),
        Commands::Check(args) => check::execute(args),
        Commands::Export(args) => export::execute(args),
    }
}
