//! Response header container.
//!
//! # Design Decisions
//! - Keys are canonicalised on insert (`x-custom` → `X-Custom`) so that the
//!   same header set twice with different casing is stored once
//! - A verbatim insertion path exists for the rare non-canonical header
//! - Values are rendered to strings at insertion; last write wins per key

use std::collections::HashMap;
use std::fmt::Display;

/// A key-normalising map of additional response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, canonicalising the key.
    pub fn set(&mut self, key: &str, value: impl Display) {
        self.entries.insert(canonical_header_key(key), value.to_string());
    }

    /// Merge headers into the container, canonicalising every key.
    pub fn set_all<K, V, I>(&mut self, headers: I)
    where
        K: AsRef<str>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in headers {
            self.set(key.as_ref(), value);
        }
    }

    /// Set a header using the key exactly as given.
    pub fn set_non_canonical(&mut self, key: &str, value: impl Display) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Return the canonical form of a header key.
///
/// The first character and any character following a hyphen are upper-cased;
/// all others are lower-cased. A key containing a space or any byte that is
/// not a valid header token character is returned unchanged.
pub fn canonical_header_key(key: &str) -> String {
    if !key.bytes().all(is_token_byte) {
        return key.to_string();
    }

    let mut upper = true;
    key.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}
