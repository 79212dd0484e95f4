//! # Name-value parameters
//!
//! [`NameValue`] is one `name[=value]` parameter as it appears on URIs,
//! header fields and SDP lines. [`NameValueList`] is an ordered collection of
//! them keyed by the lower-cased name:
//!
//! ```
//! use sipkit_sip_core::types::name_value::NameValueList;
//!
//! let mut params = NameValueList::new(';');
//! params.set("transport", Some("udp"));
//! params.set("lr", None::<&str>);
//! params.set("Transport", Some("tcp"));
//! assert_eq!(params.encode(), "transport=tcp;lr");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `name[=value]` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: Option<String>,
    /// Value was written between double quotes
    pub quoted: bool,
    /// Character between name and value, usually `=`
    pub separator: char,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        NameValue {
            name: name.into(),
            value: Some(value.into()),
            quoted: false,
            separator: '=',
        }
    }

    /// A parameter with a quoted value.
    pub fn quoted(name: impl Into<String>, value: impl Into<String>) -> Self {
        NameValue {
            quoted: true,
            ..NameValue::new(name, value)
        }
    }

    /// A valueless parameter such as `lr`.
    pub fn flag(name: impl Into<String>) -> Self {
        NameValue {
            name: name.into(),
            value: None,
            quoted: false,
            separator: '=',
        }
    }

    /// Lower-cased lookup key.
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    fn value_eq(&self, other: &NameValue) -> bool {
        match (&self.value, &other.value) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if self.quoted || other.quoted {
                    a == b
                } else {
                    a.eq_ignore_ascii_case(b)
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for NameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match &self.value {
            Some(v) if self.quoted => write!(f, "{}\"{}\"", self.separator, v),
            Some(v) => write!(f, "{}{}", self.separator, v),
            None => Ok(()),
        }
    }
}

/// Ordered parameters with unique, case-insensitive names.
///
/// Writing an existing name replaces its value in place, so encoding keeps
/// the order in which names were first seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameValueList {
    entries: Vec<NameValue>,
    separator: char,
}

impl NameValueList {
    /// Creates an empty list joined by `separator` when encoded.
    pub fn new(separator: char) -> Self {
        NameValueList {
            entries: Vec::new(),
            separator,
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn set_separator(&mut self, separator: char) {
        self.separator = separator;
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|nv| nv.name.eq_ignore_ascii_case(name))
    }

    /// Adds `nv`. An entry with the same name keeps its spelling and slot
    /// and takes the new value.
    pub fn add(&mut self, nv: NameValue) {
        match self.index_of(&nv.name) {
            Some(i) => {
                let name = std::mem::take(&mut self.entries[i].name);
                self.entries[i] = NameValue { name, ..nv };
            }
            None => self.entries.push(nv),
        }
    }

    /// Sets an unquoted value, or a bare name when `value` is `None`.
    pub fn set<V: Into<String>>(&mut self, name: &str, value: Option<V>) {
        let nv = match value {
            Some(v) => NameValue::new(name, v),
            None => NameValue::flag(name),
        };
        self.add(nv);
    }

    pub fn get(&self, name: &str) -> Option<&NameValue> {
        self.index_of(name).map(|i| &self.entries[i])
    }

    /// Value of `name`; `None` both when absent and when valueless.
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|nv| nv.value.as_deref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Removes and returns the entry named `name`.
    pub fn remove(&mut self, name: &str) -> Option<NameValue> {
        self.index_of(name).map(|i| self.entries.remove(i))
    }

    /// Names in insertion order, as originally written.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|nv| nv.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NameValue> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NameValueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, nv) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.separator)?;
            }
            write!(f, "{}", nv)?;
        }
        Ok(())
    }
}

impl PartialEq for NameValueList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|nv| {
                other
                    .get(&nv.name)
                    .map(|o| nv.value_eq(o))
                    .unwrap_or(false)
            })
    }
}

impl Eq for NameValueList {}

impl<'a> IntoIterator for &'a NameValueList {
    type Item = &'a NameValue;
    type IntoIter = std::slice::Iter<'a, NameValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_write_replaces_in_place() {
        let mut list = NameValueList::new(';');
        list.set("a", Some("1"));
        list.set("b", Some("2"));
        list.set("A", Some("3"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.encode(), "a=3;b=2");
        assert_eq!(list.get("A").and_then(|nv| nv.value.as_deref()), Some("3"));
        assert_eq!(list.get_value("a"), Some("3"));
    }

    #[test]
    fn test_encode_quoted_and_flags() {
        let mut list = NameValueList::new('&');
        list.add(NameValue::quoted("subject", "project x"));
        list.set("lr", None::<String>);
        assert_eq!(list.encode(), "subject=\"project x\"&lr");
    }

    #[test]
    fn test_equality_ignores_order_and_unquoted_case() {
        let mut a = NameValueList::new(';');
        a.set("transport", Some("TCP"));
        a.set("lr", None::<String>);
        let mut b = NameValueList::new(';');
        b.set("LR", None::<String>);
        b.set("Transport", Some("tcp"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_quoted_values_compare_case_sensitively() {
        let mut a = NameValueList::new(';');
        a.add(NameValue::quoted("realm", "Example"));
        let mut b = NameValueList::new(';');
        b.add(NameValue::quoted("realm", "example"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_returns_entry() {
        let mut list = NameValueList::new(';');
        list.set("ttl", Some("5"));
        let removed = list.remove("TTL").unwrap();
        assert_eq!(removed.value.as_deref(), Some("5"));
        assert!(list.is_empty());
        assert!(list.remove("ttl").is_none());
    }
}
