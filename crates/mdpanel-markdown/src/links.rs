//! Link reference definitions collected while tokenizing blocks.

use std::collections::HashMap;

/// Target of a `[label]: href "title"` definition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkReference {
    pub href: String,
    pub title: Option<String>,
}

/// Table of link definitions keyed by normalized label.
///
/// Labels compare case-insensitively with whitespace runs collapsed, and
/// the first definition of a label wins.
#[derive(Clone, Debug, Default)]
pub struct LinkReferences {
    entries: HashMap<String, LinkReference>,
}

impl LinkReferences {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercase `label` and collapse whitespace runs to a single space.
    pub fn normalize_label(label: &str) -> String {
        let mut normalized = String::with_capacity(label.len());
        let mut in_space = false;
        for c in label.chars() {
            if c.is_whitespace() {
                if !in_space {
                    normalized.push(' ');
                }
                in_space = true;
            } else {
                normalized.extend(c.to_lowercase());
                in_space = false;
            }
        }
        normalized
    }

    /// Register a definition unless the label is already taken.
    ///
    /// Returns `false` when an earlier definition shadows this one.
    pub fn define(&mut self, label: &str, reference: LinkReference) -> bool {
        let key = Self::normalize_label(label);
        if self.entries.contains_key(&key) {
            tracing::trace!(label = %key, "Ignoring duplicate link definition");
            return false;
        }
        self.entries.insert(key, reference);
        true
    }

    /// Look up a label, normalizing it first.
    pub fn get(&self, label: &str) -> Option<&LinkReference> {
        self.entries.get(&Self::normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn reference(href: &str) -> LinkReference {
        LinkReference {
            href: href.to_owned(),
            title: None,
        }
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(LinkReferences::normalize_label("Foo  Bar"), "foo bar");
        assert_eq!(LinkReferences::normalize_label("a\n\tb"), "a b");
        assert_eq!(LinkReferences::normalize_label("ÄB"), "äb");
    }

    #[test]
    fn test_first_definition_wins() {
        let mut links = LinkReferences::new();

        assert!(links.define("Docs", reference("/first")));
        assert!(!links.define("docs", reference("/second")));

        assert_eq!(links.len(), 1);
        assert_eq!(links.get("DOCS").map(|r| r.href.as_str()), Some("/first"));
    }

    #[test]
    fn test_lookup_collapses_whitespace() {
        let mut links = LinkReferences::new();
        links.define("user guide", reference("/guide"));

        assert!(links.get("User\n   Guide").is_some());
        assert!(links.get("userguide").is_none());
    }
}
