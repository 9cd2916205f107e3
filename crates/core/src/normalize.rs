//! SQL text normalization
//!
//! Captured statements pass through two transformations before they are
//! aggregated:
//!
//! 1. [`truncate`] bounds the text to a character ceiling (default 16384),
//!    keeping the head of the statement and marking the cut with `...`.
//! 2. [`obfuscate`] replaces literal values with `?` so that traces never
//!    carry user data.
//!
//! ## Obfuscation Rules
//!
//! | Token | Example | Result |
//! |-------|---------|--------|
//! | single-quoted literal | `'bar'`, `'it''s'` | `?` |
//! | backslash escape (MySQL, unknown) | `'it\'s'` | `?` |
//! | double-quoted literal (MySQL, unknown) | `"bar"` | `?` |
//! | numeric literal | `42`, `3.14`, `1e9`, `0x1F` | `?` |
//! | identifier containing digits | `test2`, `t1.col` | unchanged |
//!
//! Because every numeric literal is replaced individually, an `IN (1,2,3)`
//! list becomes `IN (?,?,?)`. Keywords, identifiers and whitespace are left
//! as they were.
//!
//! PostgreSQL and SQLite treat a backslash inside a literal as an ordinary
//! character, so `'C:\'` ends at its second quote there. Dollar-quoted
//! strings, `E'...'` escape strings, nested comments and multi-statement
//! text are not treated specially.

use crate::config::RecordSql;
use crate::types::DatabaseAdapter;

/// Default truncation ceiling, in characters
pub const MAX_SQL_LENGTH: usize = 16384;

/// Marker appended to truncated statements
pub const ELLIPSIS: &str = "...";

/// Replacement text when SQL recording is off
pub const SQL_NOT_RECORDED: &str = "<sql not recorded>";

/// Statement text ready for aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Text as it will appear in the trace
    pub text: String,
    /// Whether literal values were replaced
    pub obfuscated: bool,
}

/// Truncate `sql` to at most `max_len` characters
///
/// Text longer than the ceiling keeps its first `max_len - 3` characters and
/// gains the [`ELLIPSIS`] marker, so the result is exactly `max_len` long.
/// Shorter text is returned unchanged.
pub fn truncate(sql: &str, max_len: usize) -> String {
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    match sql.char_indices().nth(max_len) {
        // More than max_len characters: cut at the `keep`-th character
        Some(_) => {
            let cut = sql
                .char_indices()
                .nth(keep)
                .map(|(idx, _)| idx)
                .unwrap_or(sql.len());
            let mut out = String::with_capacity(cut + ELLIPSIS.len());
            out.push_str(&sql[..cut]);
            out.push_str(ELLIPSIS);
            out
        }
        None => sql.to_string(),
    }
}

/// Whether `sql` ends with the truncation marker
pub fn is_truncated(sql: &str) -> bool {
    sql.ends_with(ELLIPSIS)
}

/// Truncate and, depending on `mode`, obfuscate or withhold `raw`
pub fn normalize(
    raw: &str,
    mode: RecordSql,
    adapter: DatabaseAdapter,
    max_len: usize,
) -> NormalizedQuery {
    let truncated = truncate(raw, max_len);
    match mode {
        RecordSql::Raw => NormalizedQuery {
            text: truncated,
            obfuscated: false,
        },
        RecordSql::Obfuscated => NormalizedQuery {
            text: obfuscate(&truncated, adapter),
            obfuscated: true,
        },
        RecordSql::Off => NormalizedQuery {
            text: SQL_NOT_RECORDED.to_string(),
            obfuscated: true,
        },
    }
}

/// Replace literal values in `sql` with `?`
pub fn obfuscate(sql: &str, adapter: DatabaseAdapter) -> String {
    let bytes = sql.as_bytes();
    let escapes = adapter.backslash_escapes();
    let mut out = String::with_capacity(sql.len());
    let mut copied = 0;
    let mut i = 0;

    // Quotes, digits and identifier punctuation are all ASCII, and UTF-8
    // continuation bytes never collide with ASCII, so byte-wise scanning
    // only ever slices on char boundaries.
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' => {
                out.push_str(&sql[copied..i]);
                out.push('?');
                i = skip_quoted(bytes, i, b'\'', escapes);
                copied = i;
            }
            b'"' if !adapter.double_quotes_are_identifiers() => {
                out.push_str(&sql[copied..i]);
                out.push('?');
                i = skip_quoted(bytes, i, b'"', escapes);
                copied = i;
            }
            b'"' => {
                // Quoted identifier: keep it, including any digits inside
                i = skip_quoted(bytes, i, b'"', escapes);
            }
            b'0'..=b'9' => {
                let end = scan_number(bytes, i);
                if end < bytes.len() && is_ident_byte(bytes[end]) {
                    // `2abc` is a word, not a number
                    i = skip_ident(bytes, end);
                } else {
                    out.push_str(&sql[copied..i]);
                    out.push('?');
                    i = end;
                    copied = i;
                }
            }
            _ if is_ident_byte(b) => {
                i = skip_ident(bytes, i);
            }
            _ => i += 1,
        }
    }

    out.push_str(&sql[copied..]);
    out
}

/// Bytes that continue an identifier or keyword
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn skip_ident(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    i
}

/// Index just past the closing quote (or the end of input if unterminated)
fn skip_quoted(bytes: &[u8], start: usize, quote: u8, escapes: bool) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if escapes && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if i + 1 < bytes.len() && bytes[i + 1] == quote {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Index just past a numeric literal starting at `start`
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let len = bytes.len();
    let mut i = start;

    if bytes[i] == b'0' && i + 1 < len && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X') {
        i += 2;
        while i < len && bytes[i].is_ascii_hexdigit() {
            i += 1;
        }
        return i;
    }

    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i + 1 < len && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < len && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < len && bytes[j].is_ascii_digit() {
            while j < len && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}
