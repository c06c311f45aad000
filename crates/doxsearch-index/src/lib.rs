//! Loader and prefix lookup for Doxygen client-side search indexes.
//!
//! Doxygen's HTML output ships a `search/` directory of JavaScript files,
//! each assigning an array literal of `[id, [label, [href, flag, scope]...]]`
//! records to `searchData`. This crate reads those files without evaluating
//! them:
//!
//! - [`load`] parses one table into an immutable [`SearchIndex`]
//! - [`SearchIndex::lookup`] answers case-insensitive prefix queries
//! - [`writer`] renders a table back to Doxygen's layout or to JSON
//! - [`Catalog`] loads a whole `search/` directory and routes queries to the
//!   right per-character table
//!
//! # Example
//!
//! ```
//! let index = doxsearch_index::load(
//!     "var searchData=\n[\n  ['_7ecipher',['~Cipher',['../cipher.html#a5',1,'esapi::Cipher']]]\n];",
//! )
//! .unwrap();
//!
//! let hits = index.lookup("~CI");
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].targets[0].qualified_name, "esapi::Cipher");
//! ```

pub mod catalog;
mod error;
mod index;
pub mod key;
pub mod literal;
pub mod writer;

pub use catalog::{Catalog, Section};
pub use error::{FormatError, FormatErrorKind, Position};
pub use index::{IndexEntry, LinkKind, SearchIndex, Target};

use literal::{Literal, Span};
use writer::TABLE_VARIABLE;

/// Load a search table.
///
/// `source` is either a bare array literal or a Doxygen index file
/// (`var searchData = [...];`). Fails with [`FormatError`] on any malformed
/// record; no partial table is returned.
pub fn load(source: &str) -> Result<SearchIndex, FormatError> {
    log::trace!("Loading search table from {} bytes", source.len());
    let table = read_table(source)?;
    let index = SearchIndex::from_literal(&table, Some(source))?;
    log::debug!("Loaded search table with {} entries", index.len());
    Ok(index)
}

fn read_table(source: &str) -> Result<Literal, FormatError> {
    if source.trim_start().starts_with(['[', '{']) {
        return literal::parse(source);
    }

    let mut statements = literal::parse_assignments(source)?;
    let position = match statements.iter().position(|s| s.name == TABLE_VARIABLE) {
        Some(i) => i,
        None if statements.len() == 1 => 0,
        None => {
            return Err(FormatError::new(
                FormatErrorKind::MissingTable,
                Span::new(0, source.len()),
                Some(source),
            ));
        }
    };
    Ok(statements.swap_remove(position).value)
}
