use crate::source::read_table;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use doxsearch_index::writer;
use std::fs;
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Doxygen `var searchData=[...]` file
    #[default]
    Js,
    /// Entries as a JSON array
    Json,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Js => write!(f, "js"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Search table to read (.js, or .json from a previous export)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Js)]
    pub format: ExportFormat,

    /// Write here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    if args.path.is_dir() {
        anyhow::bail!(
            "'{}' is a directory; export works on a single search table",
            args.path.display()
        );
    }
    let index = read_table(&args.path)?;

    let mut rendered = match args.format {
        ExportFormat::Js => writer::to_js(&index),
        ExportFormat::Json => writer::to_json(&index).context("Failed to serialize index")?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match &args.output {
        Some(out) => {
            fs::write(out, &rendered)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!(
                "Wrote {} entries to {} as {}",
                index.len(),
                out.display(),
                args.format
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
