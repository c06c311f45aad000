//! Doxygen search ids.
//!
//! Doxygen lowercases a symbol and writes every byte outside `[a-z0-9]` as
//! `_` plus two lowercase hex digits, so `~Cipher` is stored as `_7ecipher`.
//! The same hex code of a name's first character selects the index file the
//! symbol lands in (`functions_7e.js`).

use crate::error::FormatErrorKind;

/// Escape a symbol into its search id.
pub fn escape_key(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    let mut buf = [0u8; 4];
    for ch in symbol.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut buf).bytes() {
                out.push('_');
                out.push_str(&format!("{byte:02x}"));
            }
        }
    }
    out
}

/// Decode a search id back into the symbol key it was built from.
pub fn unescape_key(id: &str) -> Result<String, FormatErrorKind> {
    let invalid = || FormatErrorKind::InvalidKey(id.to_string());
    let bytes = id.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'_' {
            let hex = id.get(i + 1..i + 3).ok_or_else(invalid)?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
            // from_str_radix accepts a leading '+'
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).map_err(|_| invalid())
}

/// Candidate keys for a user query, in the order they should be tried.
///
/// The lowercased query always comes first, so a key that merely looks like
/// a search id (`hash_32`) still matches itself. When the query is written as
/// a search id and decodes to something else (`_7eci` means `~ci`), the
/// decoded key follows as a fallback.
pub fn query_keys(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let id_like = lowered.contains('_')
        && lowered
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    let decoded = id_like
        .then(|| unescape_key(&lowered).ok())
        .flatten()
        .map(|key| key.to_lowercase())
        .filter(|key| *key != lowered);

    let mut keys = vec![lowered];
    keys.extend(decoded);
    keys
}

/// File stem of the index holding `section` symbols starting with `first`,
/// e.g. `functions_7e` for destructors.
///
/// The code is the first UTF-16 unit of the lowercased character, the same
/// value the search box gets from `charCodeAt(0)`. Characters outside the
/// BMP therefore share a file per high surrogate (`classes_d83d`).
pub fn index_file_stem(section: &str, first: char) -> String {
    let first = first.to_lowercase().next().unwrap_or(first);
    let mut units = [0u16; 2];
    let code = first.encode_utf16(&mut units)[0];
    format!("{section}_{code:02x}")
}

/// Split an index file stem into its section name and first-character code.
pub fn parse_file_stem(stem: &str) -> Option<(&str, u16)> {
    let (section, hex) = stem.rsplit_once('_')?;
    if section.is_empty() || !section.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let code = u16::from_str_radix(hex, 16).ok()?;
    Some((section, code))
}
