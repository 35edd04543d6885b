//! Key normalization.
//!
//! Every key that enters or queries the indexes goes through [`normalize`].
//! Two raw strings refer to the same compound or category exactly when
//! their normalized forms are equal; there is no other comparison.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// A canonicalized lookup key: whitespace runs collapsed to one space,
/// trimmed, lowercased.
///
/// Can only be produced by [`normalize`] (or [`NormalizedKey::new`]), so a
/// value of this type is always in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Normalizes `raw` into a key.
    pub fn new(raw: &str) -> Self {
        normalize(Some(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Unicode whitespace plus the byte-order mark, which spreadsheet exports
/// leave at the start of cells.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Canonicalizes a free-text key.
///
/// Replaces every run of whitespace (including U+FEFF) with a single space, trims both ends
/// and lowercases the result. `None` and empty input yield the empty key.
/// Total and idempotent.
pub fn normalize(raw: Option<&str>) -> NormalizedKey {
    let Some(raw) = raw else {
        return NormalizedKey::default();
    };

    // Dropping empty pieces removes leading/trailing runs, so joining with
    // a single space both collapses and trims.
    let mut out = String::with_capacity(raw.len());
    for word in raw.split(is_separator).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    NormalizedKey(out.to_lowercase())
}
