//! String-keyed element options.
//!
//! Block attribute lists such as `[source,rust,linenums]` or
//! `[#intro.lead,title="Intro"]` end up as flat string maps attached to
//! elements. Positional attributes are stored under `"1"`, `"2"`, ...
//! and flags such as `%header` or `opts=header` as `"header-option"`.

use std::collections::BTreeMap;

/// Immutable string map attached to an element.
///
/// There is no mutable access once built; [`with`](Self::with) and
/// [`merged`](Self::merged) return new values.
///
/// # Example
///
/// ```
/// use adoc_model::Options;
///
/// let options = Options::new()
///     .with("role", "lead")
///     .with("header-option", "");
/// assert_eq!(options.get("role"), Some("lead"));
/// assert!(options.has_option("header"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    /// Create an empty options map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Return a copy without `key`.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    /// Merge `other` on top of `self`; values from `other` win.
    #[must_use]
    pub fn merged(&self, other: &Options) -> Self {
        let mut map = self.0.clone();
        map.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(map)
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get a value by key, falling back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Check whether a flag option such as `%header` or `opts=header` is set.
    pub fn has_option(&self, name: &str) -> bool {
        self.0.contains_key(&format!("{name}-option"))
    }

    /// Positional attribute (1-based).
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.get(&index.to_string())
    }

    /// The `id` option.
    pub fn id(&self) -> Option<&str> {
        self.get("id").filter(|id| !id.is_empty())
    }

    /// The `role` option.
    pub fn role(&self) -> Option<&str> {
        self.get("role").filter(|role| !role.is_empty())
    }

    /// The block title (from a `.Title` line).
    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Options {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }
}

impl From<BTreeMap<String, String>> for Options {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
