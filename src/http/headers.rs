//! Header field storage and line-at-a-time header parsing.
//!
//! Field names are normalized to lower case on every insertion, so lookups
//! are case-insensitive. Inserting a name that is already present appends the
//! new value to the existing one as a comma-separated list.

use std::collections::HashMap;
use std::collections::hash_map;

const CRLF: &[u8] = b"\r\n";

/// Errors raised while parsing or inserting a header field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("invalid header: missing ':'")]
    MissingColon,
    #[error("invalid header: empty key")]
    EmptyKey,
    #[error("invalid header: space before ':'")]
    SpaceBeforeColon,
    #[error("invalid header key character ({0:?}): must only contain alphabetical characters, digits, and special characters")]
    InvalidKeyChar(char),
}

/// A case-insensitive map of header field names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a single `name: value\r\n` line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// terminates a header block was found. `(0, false)` means `data` holds no
    /// complete line yet and the caller must supply more bytes. On error
    /// nothing is consumed and the map is left untouched.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<(usize, bool), HeaderError> {
        let idx = match find_crlf(data) {
            None => return Ok((0, false)),
            Some(0) => return Ok((CRLF.len(), true)),
            Some(idx) => idx,
        };

        let line = &data[..idx];
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(HeaderError::MissingColon)?;
        let (name, value) = (&line[..colon], &line[colon + 1..]);

        if name.is_empty() {
            return Err(HeaderError::EmptyKey);
        }
        if name.ends_with(b" ") {
            return Err(HeaderError::SpaceBeforeColon);
        }
        if let Some(&bad) = name.iter().find(|&&b| !is_token_char(b)) {
            return Err(HeaderError::InvalidKeyChar(bad as char));
        }

        // validated above: the name is pure ASCII
        let name = String::from_utf8_lossy(name.trim_ascii()).to_ascii_lowercase();
        // obs-text bytes in the value are legal on the wire
        let value = String::from_utf8_lossy(value.trim_ascii());

        self.merge(name, &value);
        Ok((idx + CRLF.len(), false))
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(&key.to_ascii_lowercase())
    }

    /// Sets `key` to `value`, discarding anything previously stored under it.
    pub fn override_value(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_ascii_lowercase(), value.into());
    }

    /// Replaces the entry stored under `prev_key` with `new_key: value`.
    ///
    /// The new entry is inserted even when `prev_key` is absent; the return
    /// value tells whether it was present.
    pub fn override_key(&mut self, prev_key: &str, new_key: &str, value: impl Into<String>) -> bool {
        let existed = self.fields.remove(&prev_key.to_ascii_lowercase()).is_some();
        self.fields.insert(new_key.to_ascii_lowercase(), value.into());
        existed
    }

    /// Validates `key` and inserts it, comma-joining with any existing value.
    pub fn add(&mut self, key: &str, value: &str) -> Result<(), HeaderError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(HeaderError::EmptyKey);
        }
        if let Some(bad) = key.chars().find(|&c| !c.is_ascii() || !is_token_char(c as u8)) {
            return Err(HeaderError::InvalidKeyChar(bad));
        }

        self.merge(key.to_ascii_lowercase(), value.trim());
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.fields.iter(),
        }
    }

    fn merge(&mut self, key: String, value: &str) {
        match self.fields.entry(key) {
            hash_map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(value);
            }
            hash_map::Entry::Vacant(entry) => {
                entry.insert(value.to_string());
            }
        }
    }
}

pub struct Iter<'a> {
    inner: hash_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returns the offset of the first `\r\n` in `data`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

/// RFC 9110 `tchar`.
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}
