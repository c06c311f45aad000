use anyhow::{Context, Result};
use doxsearch_index::{writer, Catalog, IndexEntry, SearchIndex};
use std::fs;
use std::path::Path;

/// An index opened from the command line: one table file or a whole
/// Doxygen `search/` directory.
pub enum IndexSource {
    Table(SearchIndex),
    Catalog(Catalog),
}

impl IndexSource {
    pub fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(Self::Catalog(Catalog::open(path)?));
        }
        Ok(Self::Table(read_table(path)?))
    }

    /// Entries matching `prefix`; `section` only applies to directories.
    pub fn search(&self, section: &str, prefix: &str) -> Vec<&IndexEntry> {
        match self {
            Self::Table(index) => index.lookup(prefix),
            Self::Catalog(catalog) => catalog.search(section, prefix),
        }
    }

    /// Every entry, in key order within each table.
    pub fn entries(&self, section: &str) -> Vec<&IndexEntry> {
        match self {
            Self::Table(index) => index.iter().collect(),
            Self::Catalog(catalog) => catalog
                .tables(section)
                .into_iter()
                .flat_map(|(_, index)| index.iter())
                .collect(),
        }
    }

    /// One-line description of what was loaded.
    pub fn summary(&self) -> String {
        match self {
            Self::Table(index) => format!("{} entries", index.len()),
            Self::Catalog(catalog) => format!(
                "{} tables in {} sections, {} entries",
                catalog.table_count(),
                catalog.sections().len(),
                catalog.entry_count()
            ),
        }
    }
}

/// Read a single table, as Doxygen JavaScript or (for `.json`) as JSON.
pub fn read_table(path: &Path) -> Result<SearchIndex> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let index = if path.extension().is_some_and(|ext| ext == "json") {
        writer::from_json(&source)
            .with_context(|| format!("Failed to load search table {}", path.display()))?
    } else {
        doxsearch_index::load(&source)
            .with_context(|| format!("Failed to load search table {}", path.display()))?
    };
    log::debug!("Loaded {} ({} entries)", path.display(), index.len());
    Ok(index)
}
