//! Rendering a [`SearchIndex`] back to the formats it can be read from.

use crate::index::{IndexEntry, LinkKind, SearchIndex, Target};
use std::fmt::Write;

/// Name of the variable Doxygen assigns each per-character table to.
pub const TABLE_VARIABLE: &str = "searchData";

/// Render the table in Doxygen's layout, one record per line.
///
/// The output loads back into an equal table, and for files Doxygen wrote
/// itself it reproduces the original text.
pub fn to_js(index: &SearchIndex) -> String {
    let mut out = format!("var {TABLE_VARIABLE}=\n[\n");
    let count = index.len();
    for (i, entry) in index.iter().enumerate() {
        out.push_str("  ");
        write_entry(&mut out, entry);
        if i + 1 < count {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("];\n");
    out
}

/// Render the table as pretty-printed JSON.
pub fn to_json(index: &SearchIndex) -> serde_json::Result<String> {
    serde_json::to_string_pretty(index)
}

/// Read a table previously written by [`to_json`], re-validating it.
pub fn from_json(json: &str) -> serde_json::Result<SearchIndex> {
    serde_json::from_str(json)
}

fn write_entry(out: &mut String, entry: &IndexEntry) {
    out.push('[');
    push_quoted(out, &entry.id);
    out.push_str(",[");
    push_quoted(out, &entry.label);
    for target in &entry.targets {
        out.push(',');
        write_target(out, target);
    }
    out.push_str("]]");
}

fn write_target(out: &mut String, target: &Target) {
    out.push('[');
    push_quoted(out, &target.anchor_path);
    out.push(',');
    match target.kind {
        LinkKind::Internal | LinkKind::External => {
            let flag = u8::from(target.kind == LinkKind::Internal);
            // Writing into a String cannot fail
            let _ = write!(out, "{flag},");
            push_quoted(out, &target.qualified_name);
        }
        LinkKind::Plain => push_quoted(out, &target.label),
    }
    out.push(']');
}

/// Single-quote a string, escaping what would end or corrupt the literal.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    push_quoted(&mut out, s);
    out
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}
