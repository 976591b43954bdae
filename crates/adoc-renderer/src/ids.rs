//! Section identifiers.
//!
//! A section without an explicit `[#id]` gets one derived from its title:
//! `idprefix` (default `_`), then the lower-cased title with whitespace
//! replaced by `idseparator` (default `_`) and other punctuation removed.
//! Repeated titles get `_2`, `_3`, ... appended.

use std::collections::HashSet;

use adoc_model::AttributeLookup;

const DEFAULT_PREFIX: &str = "_";
const DEFAULT_SEPARATOR: &str = "_";

/// Id derived from `title`, without deduplication.
pub(crate) fn id_for_title(title: &str, prefix: &str, separator: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + title.len());
    id.push_str(prefix);
    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            id.push(c);
        } else if c.is_whitespace() {
            id.push_str(separator);
        } else if separator.contains(c) {
            id.push(c);
        }
    }
    id
}

/// Hands out unique ids within one document.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    prefix: String,
    separator: String,
    used: HashSet<String>,
}

impl IdGenerator {
    pub fn new(attributes: &dyn AttributeLookup) -> Self {
        Self {
            prefix: attributes
                .attribute("idprefix")
                .unwrap_or(DEFAULT_PREFIX)
                .to_owned(),
            separator: attributes
                .attribute("idseparator")
                .unwrap_or(DEFAULT_SEPARATOR)
                .to_owned(),
            used: HashSet::new(),
        }
    }

    /// Record an explicit id so generated ones do not collide with it.
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_owned());
    }

    /// Unique id for a section titled `title`.
    pub fn generate(&mut self, title: &str) -> String {
        let base = id_for_title(title, &self.prefix, &self.separator);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn generator() -> IdGenerator {
        IdGenerator::new(&BTreeMap::new())
    }

    #[test]
    fn test_id_for_title() {
        assert_eq!(id_for_title("Foo", "_", "_"), "_foo");
        assert_eq!(id_for_title("Getting Started", "_", "_"), "_getting_started");
        assert_eq!(id_for_title("What's new?", "_", "_"), "_whats_new");
        assert_eq!(id_for_title("snake_case", "_", "_"), "_snake_case");
        assert_eq!(id_for_title("Café crème", "_", "_"), "_café_crème");
    }

    #[test]
    fn test_custom_prefix_and_separator() {
        assert_eq!(id_for_title("Getting Started", "", "-"), "getting-started");
        assert_eq!(id_for_title("a-b c", "sec-", "-"), "sec-a-b-c");
        assert_eq!(id_for_title("a-b c", "_", "_"), "_ab_c");
    }

    #[test]
    fn test_duplicates_are_numbered() {
        let mut ids = generator();
        assert_eq!(ids.generate("Intro"), "_intro");
        assert_eq!(ids.generate("Intro"), "_intro_2");
        assert_eq!(ids.generate("Intro"), "_intro_3");
    }

    #[test]
    fn test_reserved_ids_are_skipped() {
        let mut ids = generator();
        ids.reserve("_usage");
        assert_eq!(ids.generate("Usage"), "_usage_2");
    }

    #[test]
    fn test_attributes_configure_generator() {
        let attributes = BTreeMap::from([
            ("idprefix".to_owned(), String::new()),
            ("idseparator".to_owned(), "-".to_owned()),
        ]);
        let mut ids = IdGenerator::new(&attributes);
        assert_eq!(ids.generate("Quick Start"), "quick-start");
    }
}
