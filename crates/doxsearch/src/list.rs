use crate::config::Config;
use crate::source::IndexSource;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search .js file or Doxygen search/ directory
    #[arg(short, long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Section to list when the index is a directory
    #[arg(short, long)]
    pub section: Option<String>,
}

pub fn execute(args: ListArgs, config: &Config) -> Result<()> {
    let path = config.index_path(args.index)?;
    let source = IndexSource::open(&path)?;
    let section = args.section.as_deref().unwrap_or(&config.section);

    for entry in source.entries(section) {
        println!("{}", entry.key);
    }
    Ok(())
}
