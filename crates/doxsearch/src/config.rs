//! `doxsearch.toml`: per-project defaults for the index location and query
//! options.
//!
//! ```toml
//! [search]
//! index = "doc/html/search"   # relative to this file
//! section = "functions"
//! limit = 20                  # 0 = unlimited
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "doxsearch.toml";
pub const DEFAULT_SECTION: &str = "all";
pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    search: SearchConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchConfig {
    /// Index file or search directory
    index: Option<PathBuf>,
    /// Section searched when the index is a directory
    section: Option<String>,
    /// Default cap on printed matches
    limit: Option<usize>,
}

/// Effective settings after applying the config file, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub index: Option<PathBuf>,
    pub section: String,
    pub limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: None,
            section: DEFAULT_SECTION.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Config {
    /// Load `explicit` if given, else the nearest `doxsearch.toml` above the
    /// current directory, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        match find_config(&cwd) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!("No {CONFIG_FILE} found above {}", cwd.display());
                Ok(Self::default())
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::debug!("Using configuration from {}", path.display());

        let base = path.parent().unwrap_or(Path::new("."));
        let defaults = Self::default();
        Ok(Self {
            index: file.search.index.map(|index| base.join(index)),
            section: file.search.section.unwrap_or(defaults.section),
            limit: file.search.limit.unwrap_or(defaults.limit),
        })
    }

    /// The index to open: the command-line path, else the configured one.
    pub fn index_path(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        match explicit.or_else(|| self.index.clone()) {
            Some(path) => Ok(path),
            None => anyhow::bail!(
                "No index given.\n\n\
                 Pass --index <PATH> (a search .js file or a Doxygen search/ directory),\n\
                 or set `index` under [search] in {CONFIG_FILE}."
            ),
        }
    }
}

/// Walk up from `start` to the first directory holding a config file.
fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn test_load_resolves_index_relative_to_file() {
        let dir = TempDir::new().unwrap();
        dir.child("docs").create_dir_all().unwrap();
        let file = dir.child("docs/doxsearch.toml");
        file.write_str("[search]\nindex = \"html/search\"\nsection = \"functions\"\nlimit = 5\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.index, Some(dir.path().join("docs/html/search")));
        assert_eq!(config.section, "functions");
        assert_eq!(config.limit, 5);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let dir = TempDir::new().unwrap();
        let file = dir.child(CONFIG_FILE);
        file.write_str("").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.index, None);
        assert_eq!(config.section, DEFAULT_SECTION);
        assert_eq!(config.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.child(CONFIG_FILE);
        file.write_str("[search]\ncategory = \"all\"\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "{err:#}");
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = TempDir::new().unwrap();
        dir.child(CONFIG_FILE).write_str("").unwrap();
        dir.child("a/b/c").create_dir_all().unwrap();

        let found = find_config(&dir.path().join("a/b/c")).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn test_index_path_prefers_command_line() {
        let config = Config {
            index: Some(PathBuf::from("configured")),
            ..Config::default()
        };
        assert_eq!(
            config.index_path(Some(PathBuf::from("flag"))).unwrap(),
            PathBuf::from("flag")
        );
        assert_eq!(config.index_path(None).unwrap(), PathBuf::from("configured"));
        assert!(Config::default().index_path(None).is_err());
    }
}
