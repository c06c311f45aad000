use crate::config::Config;
use crate::source::IndexSource;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use doxsearch_index::IndexEntry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Symbol prefix, as typed (`~Cipher`) or as a search id (`_7ecipher`)
    pub prefix: String,

    /// Search .js file or Doxygen search/ directory
    #[arg(short, long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Section to search when the index is a directory
    #[arg(short, long)]
    pub section: Option<String>,

    /// Maximum number of entries to print (0 = unlimited)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: LookupArgs, config: &Config) -> Result<()> {
    let path = config.index_path(args.index)?;
    let source = IndexSource::open(&path)?;
    log::debug!("Opened {}: {}", path.display(), source.summary());

    let section = args.section.as_deref().unwrap_or(&config.section);
    let matches = source.search(section, &args.prefix);
    if matches.is_empty() {
        anyhow::bail!("No entries match '{}'", args.prefix);
    }

    let limit = match args.limit.unwrap_or(config.limit) {
        0 => matches.len(),
        n => n.min(matches.len()),
    };
    let (shown, hidden) = matches.split_at(limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    for entry in shown {
        print_entry(entry);
    }
    if !hidden.is_empty() {
        println!(
            "{}",
            format!("... {} more (use --limit 0 to show all)", hidden.len()).dimmed()
        );
    }
    Ok(())
}

fn print_entry(entry: &IndexEntry) {
    println!("{}", entry.label.bold());
    for target in &entry.targets {
        let name = if target.qualified_name.is_empty() {
            &target.label
        } else {
            &target.qualified_name
        };
        println!("  {name}  {}", target.anchor_path.dimmed());
    }
}
