//! A whole Doxygen `search/` directory.
//!
//! Doxygen splits its index by section (`all`, `classes`, `functions`, ...)
//! and by the first character of each symbol, writing `<section>_<hex>.js`
//! per pair. The search box only ever loads the file for the first character
//! typed; [`Catalog::search`] does the same.

use crate::index::{IndexEntry, SearchIndex};
use crate::key::{index_file_stem, parse_file_stem, query_keys};
use crate::literal::{self, Literal};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Section metadata file written next to the index files.
pub const SEARCH_DATA_FILE: &str = "searchdata.js";

/// An index section, e.g. `functions` labelled "Functions".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub label: String,
    /// First characters that have an index file, when `searchdata.js` says so
    pub initials: Option<String>,
}

/// Every index table of a search directory, keyed by file stem.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    sections: Vec<Section>,
    tables: BTreeMap<String, SearchIndex>,
}

impl Catalog {
    /// Load every `<section>_<hex>.js` file under `dir`.
    ///
    /// A malformed file fails the whole catalog.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("'{}' is not a directory", dir.display());
        }

        let mut tables = BTreeMap::new();
        for path in collect_index_files(dir)? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let index = crate::load(&source)
                .with_context(|| format!("Failed to load search table {}", path.display()))?;
            log::debug!("Loaded {} ({} entries)", path.display(), index.len());
            tables.insert(stem.to_string(), index);
        }

        let metadata = dir.join(SEARCH_DATA_FILE);
        let sections = if metadata.is_file() {
            let source = fs::read_to_string(&metadata)
                .with_context(|| format!("Failed to read {}", metadata.display()))?;
            read_sections(&source)
                .with_context(|| format!("Failed to read sections from {}", metadata.display()))?
        } else {
            infer_sections(&tables)
        };

        Ok(Self {
            root: dir.to_path_buf(),
            sections,
            tables,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sections in display order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Number of index files loaded.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Total number of entries over all tables.
    pub fn entry_count(&self) -> usize {
        self.tables.values().map(SearchIndex::len).sum()
    }

    /// The table holding `section` symbols starting with `first`.
    pub fn table(&self, section: &str, first: char) -> Option<&SearchIndex> {
        self.tables.get(&index_file_stem(section, first))
    }

    /// All tables of a section, ordered by first-character code.
    pub fn tables(&self, section: &str) -> Vec<(&str, &SearchIndex)> {
        let mut found: Vec<_> = self
            .tables
            .iter()
            .filter_map(|(stem, index)| {
                let (name, code) = parse_file_stem(stem)?;
                (name == section).then_some((code, stem.as_str(), index))
            })
            .collect();
        found.sort_by_key(|(code, _, _)| *code);
        found
            .into_iter()
            .map(|(_, stem, index)| (stem, index))
            .collect()
    }

    /// Entries of `section` matching `query`, in key order.
    ///
    /// Leading spaces are ignored, like the search box does. An empty query
    /// matches nothing. A query written as a search id is only decoded when
    /// it matches nothing as written.
    pub fn search(&self, section: &str, query: &str) -> Vec<&IndexEntry> {
        query_keys(query.trim_start_matches(' '))
            .iter()
            .map(|key| self.search_key(section, key))
            .find(|hits| !hits.is_empty())
            .unwrap_or_default()
    }

    fn search_key(&self, section: &str, key: &str) -> Vec<&IndexEntry> {
        let Some(first) = key.chars().next() else {
            return Vec::new();
        };
        match self.table(section, first) {
            Some(index) => index.lookup_key(key),
            None => {
                log::debug!(
                    "No table {} in {}",
                    index_file_stem(section, first),
                    self.root.display()
                );
                Vec::new()
            }
        }
    }
}

fn collect_index_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        let is_index = path.extension().is_some_and(|ext| ext == "js")
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(parse_file_stem)
                .is_some();
        if entry.file_type().is_file() && is_index {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read `indexSectionNames`, `indexSectionLabels` and
/// `indexSectionsWithContent` from `searchdata.js`.
fn read_sections(source: &str) -> Result<Vec<Section>> {
    let statements = literal::parse_assignments(source)?;
    let object = |name: &str| -> Result<Option<BTreeMap<u32, String>>> {
        statements
            .iter()
            .find(|s| s.name == name)
            .map(|s| numbered_strings(name, &s.value))
            .transpose()
    };

    let names = object("indexSectionNames")?
        .context("searchdata.js has no indexSectionNames")?;
    let labels = object("indexSectionLabels")?.unwrap_or_default();
    let initials = object("indexSectionsWithContent")?.unwrap_or_default();

    Ok(names
        .into_iter()
        .map(|(n, name)| Section {
            label: labels.get(&n).cloned().unwrap_or_else(|| title_case(&name)),
            initials: initials.get(&n).cloned(),
            name,
        })
        .collect())
}

fn numbered_strings(name: &str, value: &Literal) -> Result<BTreeMap<u32, String>> {
    let fields = value
        .as_object()
        .with_context(|| format!("{name} must be an object, found {}", value.type_name()))?;
    fields
        .iter()
        .map(|(key, v)| {
            let n = key
                .parse::<u32>()
                .with_context(|| format!("{name} has non-numeric key '{key}'"))?;
            let s = v
                .as_str()
                .with_context(|| format!("{name}[{key}] must be a string"))?;
            Ok((n, s.to_string()))
        })
        .collect()
}

/// Sections from file names alone: `all` first, the rest alphabetical.
fn infer_sections(tables: &BTreeMap<String, SearchIndex>) -> Vec<Section> {
    let mut names: Vec<&str> = tables
        .keys()
        .filter_map(|stem| parse_file_stem(stem).map(|(name, _)| name))
        .collect();
    names.sort_by_key(|name| (*name != "all", *name));
    names.dedup();

    names
        .into_iter()
        .map(|name| Section {
            name: name.to_string(),
            label: title_case(name),
            initials: None,
        })
        .collect()
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FUNCTIONS_7E: &str = "var searchData=
[
  ['_7ecipher',['~Cipher',['../classesapi_1_1_cipher.html#a5881',1,'esapi::Cipher']]],
  ['_7ecodec',['~Codec',['../classesapi_1_1_codec.html#a2b06',1,'esapi::Codec']]]
];
";

    const CLASSES_63: &str = "var searchData=
[
  ['cipher',['Cipher',['../classesapi_1_1_cipher.html',1,'esapi']]]
];
";

    const SEARCH_DATA: &str = "var indexSectionsWithContent =
{
  0: \"c~\",
  1: \"c\",
  2: \"~\"
};

var indexSectionNames =
{
  0: \"all\",
  1: \"classes\",
  2: \"functions\"
};

var indexSectionLabels =
{
  0: \"All\",
  1: \"Classes\",
  2: \"Functions\"
};
";

    fn search_dir(with_metadata: bool) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("functions_7e.js"), FUNCTIONS_7E).unwrap();
        fs::write(dir.path().join("classes_63.js"), CLASSES_63).unwrap();
        fs::write(dir.path().join("search.js"), "function SearchBox() {}").unwrap();
        fs::write(dir.path().join("nomatches.html"), "<html></html>").unwrap();
        if with_metadata {
            fs::write(dir.path().join(SEARCH_DATA_FILE), SEARCH_DATA).unwrap();
        }
        dir
    }

    #[test]
    fn test_open_skips_non_index_files() {
        let dir = search_dir(false);
        let catalog = Catalog::open(dir.path()).unwrap();
        assert_eq!(catalog.table_count(), 2);
        assert_eq!(catalog.entry_count(), 3);
    }

    #[test]
    fn test_search_routes_by_first_character() {
        let dir = search_dir(false);
        let catalog = Catalog::open(dir.path()).unwrap();

        let labels = |section: &str, query: &str| -> Vec<String> {
            catalog
                .search(section, query)
                .iter()
                .map(|e| e.label.clone())
                .collect()
        };
        assert_eq!(labels("functions", "~c"), vec!["~Cipher", "~Codec"]);
        assert_eq!(labels("functions", "  ~CI"), vec!["~Cipher"]);
        assert_eq!(labels("functions", "_7eco"), vec!["~Codec"]);
        assert_eq!(labels("classes", "ci"), vec!["Cipher"]);
        assert!(labels("classes", "~c").is_empty());
        assert!(labels("functions", "").is_empty());
    }

    #[test]
    fn test_search_prefers_literal_key_over_decoded_id() {
        let dir = search_dir(false);
        fs::write(
            dir.path().join("functions_68.js"),
            "var searchData=
[
  ['hash2',['hash2',['../h.html#b',1,'esapi']]],
  ['hash_5f32',['hash_32',['../h.html#a',1,'esapi']]]
];
",
        )
        .unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();

        let labels = |query: &str| -> Vec<String> {
            catalog
                .search("functions", query)
                .iter()
                .map(|e| e.label.clone())
                .collect()
        };
        assert_eq!(labels("hash_32"), vec!["hash_32"]);
        assert_eq!(labels("hash2"), vec!["hash2"]);
        assert_eq!(labels("hash_5f3"), vec!["hash_32"]);
    }

    #[test]
    fn test_sections_inferred_without_metadata() {
        let dir = search_dir(false);
        let catalog = Catalog::open(dir.path()).unwrap();
        let names: Vec<_> = catalog.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["classes", "functions"]);
        assert_eq!(catalog.section("functions").unwrap().label, "Functions");
    }

    #[test]
    fn test_sections_from_search_data() {
        let dir = search_dir(true);
        let catalog = Catalog::open(dir.path()).unwrap();
        assert_eq!(
            catalog.sections()[2],
            Section {
                name: "functions".into(),
                label: "Functions".into(),
                initials: Some("~".into()),
            }
        );
        assert_eq!(catalog.sections()[0].name, "all");
    }

    #[test]
    fn test_tables_for_section() {
        let dir = search_dir(false);
        let catalog = Catalog::open(dir.path()).unwrap();
        let stems: Vec<_> = catalog
            .tables("functions")
            .into_iter()
            .map(|(stem, _)| stem)
            .collect();
        assert_eq!(stems, vec!["functions_7e"]);
        assert!(catalog.table("functions", '~').is_some());
    }

    #[test]
    fn test_malformed_file_fails_whole_catalog() {
        let dir = search_dir(false);
        fs::write(
            dir.path().join("functions_61.js"),
            "var searchData=\n[\n  ['a']\n];\n",
        )
        .unwrap();
        let err = Catalog::open(dir.path()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("functions_61.js"), "{message}");
        assert!(message.contains("record has 1 elements"), "{message}");
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = search_dir(false);
        assert!(Catalog::open(&dir.path().join("functions_7e.js")).is_err());
    }
}
