//! Stable statement identity
//!
//! The collector correlates traces across processes and harvest cycles by a
//! 32-bit id derived from the statement text. The id must be identical for
//! the same text in every process, so it is built from MD5 rather than a
//! randomly seeded hasher:
//!
//! ```text
//! id_normal_form(sql) = obfuscate(sql), all whitespace removed, every "?," removed
//! sql_id(sql)         = big-endian md5(id_normal_form(sql)) mod (2^31 - 1)
//! ```
//!
//! The modulus keeps the id inside a signed 32-bit column.

use crate::normalize::obfuscate;
use crate::types::DatabaseAdapter;
use md5::{Digest, Md5};

const SQL_ID_MODULUS: u64 = (1 << 31) - 1;

/// Compute the stable id for a statement
pub fn sql_id(sql: &str) -> i32 {
    let digest = Md5::digest(id_normal_form(sql).as_bytes());
    let id = digest
        .iter()
        .fold(0u64, |acc, &b| ((acc << 8) | u64::from(b)) % SQL_ID_MODULUS);
    // id < 2^31 - 1, so the conversion cannot fail
    id as i32
}

/// Collapse a statement to the text that is hashed
///
/// Literal values and their separators disappear, so `IN (1, 2)` and
/// `IN (1,2,3)` collapse to the same form.
pub fn id_normal_form(sql: &str) -> String {
    let compact: String = obfuscate(sql, DatabaseAdapter::Other)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    compact.replace("?,", "")
}
