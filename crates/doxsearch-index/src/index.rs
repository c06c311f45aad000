//! The search table: entries keyed by normalized symbol, each pointing at one
//! or more documentation anchors.

use crate::error::{FormatError, FormatErrorKind};
use crate::key::{escape_key, query_keys, unescape_key};
use crate::literal::{Literal, Span};
use serde::{Deserialize, Serialize};

/// How a target was recorded in the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// `[href, 1, scope]`: a page of this documentation set
    #[default]
    Internal,
    /// `[href, 0, scope]`: a page reached through a tag file
    External,
    /// `[href, linkText]`: an explicitly labeled link without scope
    Plain,
}

/// A documentation location a key resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Relative URL with fragment, e.g. `../classesapi_1_1_key.html#af06e...`
    pub anchor_path: String,
    /// Link text shown to the user
    pub label: String,
    /// Namespace-qualified scope, e.g. `esapi::Key`; empty for plain links
    #[serde(default)]
    pub qualified_name: String,
    #[serde(default)]
    pub kind: LinkKind,
}

impl Target {
    pub fn internal(
        anchor_path: impl Into<String>,
        label: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        Self {
            anchor_path: anchor_path.into(),
            label: label.into(),
            qualified_name: qualified_name.into(),
            kind: LinkKind::Internal,
        }
    }

    pub fn plain(anchor_path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            anchor_path: anchor_path.into(),
            label: label.into(),
            qualified_name: String::new(),
            kind: LinkKind::Plain,
        }
    }
}

/// One record of the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Search id exactly as stored, e.g. `_7ecipher`
    pub id: String,
    /// Decoded lowercase key, e.g. `~cipher`; always derived from `id`
    #[serde(skip_deserializing, default)]
    pub key: String,
    /// Symbol label, e.g. `~Cipher`
    pub label: String,
    pub targets: Vec<Target>,
    #[serde(skip)]
    span: Span,
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.key == other.key
            && self.label == other.label
            && self.targets == other.targets
    }
}

impl Eq for IndexEntry {}

impl IndexEntry {
    /// Build an entry from its stored id.
    pub fn new(id: impl Into<String>, label: impl Into<String>, targets: Vec<Target>) -> Self {
        Self {
            id: id.into(),
            key: String::new(),
            label: label.into(),
            targets,
            span: Span::synthetic(),
        }
    }

    /// Build an entry for a symbol, deriving the id the way Doxygen does.
    pub fn for_symbol(label: impl Into<String>, targets: Vec<Target>) -> Self {
        let label = label.into();
        Self::new(escape_key(&label), label, targets)
    }

    /// Source span of the record, synthetic when not parsed from text.
    pub fn span(&self) -> Span {
        self.span
    }
}

/// An immutable, sorted search table.
///
/// Built once by [`crate::load`] (or from JSON) and then only read; lookups
/// borrow from it and it can be shared across threads without locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<IndexEntry>", into = "Vec<IndexEntry>")]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    /// Validate entries and build the table, sorting them by key.
    pub fn new(entries: Vec<IndexEntry>) -> Result<Self, FormatError> {
        Self::build(entries, None)
    }

    /// Interpret a parsed `[[id, [label, target...]], ...]` literal.
    pub fn from_literal(table: &Literal, source: Option<&str>) -> Result<Self, FormatError> {
        let err = |kind, span| FormatError::new(kind, span, source);

        let records = table.as_array().ok_or_else(|| {
            err(
                FormatErrorKind::ExpectedArray {
                    context: "search table",
                    found: table.type_name(),
                },
                table.span,
            )
        })?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(parse_record(record, source)?);
        }

        log::debug!("Read {} search records", entries.len());
        Self::build(entries, source)
    }

    fn build(mut entries: Vec<IndexEntry>, source: Option<&str>) -> Result<Self, FormatError> {
        let err = |kind, span| FormatError::new(kind, span, source);

        for entry in &mut entries {
            entry.key = unescape_key(&entry.id)
                .map_err(|kind| err(kind, entry.span))?
                .to_lowercase();
            validate_targets(entry).map_err(|kind| err(kind, entry.span))?;
        }

        if !entries.is_sorted_by(|a, b| a.key <= b.key) {
            log::debug!("Search table is not in key order; sorting {} entries", entries.len());
            entries.sort_by(|a, b| a.key.cmp(&b.key));
        }

        if let Some(pair) = entries.windows(2).find(|w| w[0].key == w[1].key) {
            return Err(err(
                FormatErrorKind::DuplicateKey(pair[1].key.clone()),
                pair[1].span,
            ));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in key order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Exact, case-insensitive key lookup.
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        query_keys(key).iter().find_map(|key| {
            self.entries
                .binary_search_by(|e| e.key.as_str().cmp(key.as_str()))
                .ok()
                .map(|i| &self.entries[i])
        })
    }

    /// All entries whose key starts with `prefix`, in key order.
    ///
    /// Matching ignores case, and the prefix may be written either as a key
    /// (`~ci`) or as a search id (`_7eci`). The literal reading wins: the id
    /// reading is only tried when nothing matches the prefix as written. An
    /// empty prefix matches everything.
    pub fn lookup(&self, prefix: &str) -> Vec<&IndexEntry> {
        query_keys(prefix)
            .iter()
            .map(|key| self.lookup_key(key))
            .find(|hits| !hits.is_empty())
            .unwrap_or_default()
    }

    /// Entries whose key starts with `prefix`, which must already be in key
    /// form.
    pub(crate) fn lookup_key(&self, prefix: &str) -> Vec<&IndexEntry> {
        let start = self.entries.partition_point(|e| e.key.as_str() < prefix);
        self.entries[start..]
            .iter()
            .take_while(|e| e.key.starts_with(prefix))
            .collect()
    }

    /// Targets of every entry matching `prefix`, flattened in key order.
    pub fn targets(&self, prefix: &str) -> Vec<&Target> {
        self.lookup(prefix)
            .into_iter()
            .flat_map(|e| e.targets.iter())
            .collect()
    }
}

impl TryFrom<Vec<IndexEntry>> for SearchIndex {
    type Error = FormatError;

    fn try_from(entries: Vec<IndexEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<SearchIndex> for Vec<IndexEntry> {
    fn from(index: SearchIndex) -> Self {
        index.entries
    }
}

impl<'a> IntoIterator for &'a SearchIndex {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn validate_targets(entry: &IndexEntry) -> Result<(), FormatErrorKind> {
    if entry.targets.is_empty() {
        return Err(FormatErrorKind::EmptyTargets(entry.id.clone()));
    }
    for target in &entry.targets {
        if target.anchor_path.is_empty() || target.anchor_path.contains(char::is_whitespace) {
            return Err(FormatErrorKind::InvalidAnchor(target.anchor_path.clone()));
        }
        // Scoped records carry no label of their own; they show the entry's
        if target.kind != LinkKind::Plain && target.label != entry.label {
            return Err(FormatErrorKind::LabelMismatch {
                expected: entry.label.clone(),
                found: target.label.clone(),
            });
        }
    }
    Ok(())
}

fn parse_record(record: &Literal, source: Option<&str>) -> Result<IndexEntry, FormatError> {
    let err = |kind, span| FormatError::new(kind, span, source);

    let fields = expect_array(record, "record", source)?;
    if fields.len() != 2 {
        return Err(err(
            FormatErrorKind::WrongArity {
                context: "record",
                expected: "2",
                found: fields.len(),
            },
            record.span,
        ));
    }

    let id = expect_str(&fields[0], "record key", source)?;
    let body = expect_array(&fields[1], "record body", source)?;
    let Some((label, target_literals)) = body.split_first() else {
        return Err(err(FormatErrorKind::EmptyTargets(id.to_string()), record.span));
    };
    let label = expect_str(label, "entry label", source)?;
    if target_literals.is_empty() {
        return Err(err(FormatErrorKind::EmptyTargets(id.to_string()), record.span));
    }

    let targets = target_literals
        .iter()
        .map(|t| parse_target(t, label, source))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IndexEntry {
        id: id.to_string(),
        key: String::new(),
        label: label.to_string(),
        targets,
        span: record.span,
    })
}

fn parse_target(target: &Literal, label: &str, source: Option<&str>) -> Result<Target, FormatError> {
    let fields = expect_array(target, "target", source)?;
    match fields {
        [href, flag, scope] => {
            let anchor_path = expect_str(href, "anchor path", source)?;
            let kind = match flag.as_int() {
                Some(1) => LinkKind::Internal,
                Some(0) => LinkKind::External,
                Some(other) => {
                    return Err(FormatError::new(
                        FormatErrorKind::InvalidFlag(other),
                        flag.span,
                        source,
                    ));
                }
                None => {
                    return Err(FormatError::new(
                        FormatErrorKind::NotAnInteger {
                            context: "link flag",
                            found: flag.type_name(),
                        },
                        flag.span,
                        source,
                    ));
                }
            };
            let scope = expect_str(scope, "scope", source)?;
            Ok(Target {
                anchor_path: anchor_path.to_string(),
                label: label.to_string(),
                qualified_name: scope.to_string(),
                kind,
            })
        }
        [href, text] => Ok(Target::plain(
            expect_str(href, "anchor path", source)?,
            expect_str(text, "link text", source)?,
        )),
        _ => Err(FormatError::new(
            FormatErrorKind::WrongArity {
                context: "target",
                expected: "2 or 3",
                found: fields.len(),
            },
            target.span,
            source,
        )),
    }
}

fn expect_array<'a>(
    value: &'a Literal,
    context: &'static str,
    source: Option<&str>,
) -> Result<&'a [Literal], FormatError> {
    value.as_array().ok_or_else(|| {
        FormatError::new(
            FormatErrorKind::ExpectedArray {
                context,
                found: value.type_name(),
            },
            value.span,
            source,
        )
    })
}

fn expect_str<'a>(
    value: &'a Literal,
    context: &'static str,
    source: Option<&str>,
) -> Result<&'a str, FormatError> {
    value.as_str().ok_or_else(|| {
        FormatError::new(
            FormatErrorKind::NotAString {
                context,
                found: value.type_name(),
            },
            value.span,
            source,
        )
    })
}
