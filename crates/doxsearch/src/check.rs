use crate::source::IndexSource;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{presets::UTF8_BORDERS_ONLY, ContentArrangement, Table};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Search .js files or Doxygen search/ directories
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Load every path, stopping at the first malformed one.
pub fn execute(args: CheckArgs) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Path", "Contents"]);

    for path in &args.paths {
        let source = IndexSource::open(path)?;
        table.add_row(vec![path.display().to_string(), source.summary()]);
    }

    println!("{table}");
    println!("{} {} checked", "ok".green().bold(), args.paths.len());
    Ok(())
}
