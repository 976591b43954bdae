//! Attribute entries and `{name}` references.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static ATTRIBUTE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(!?)([A-Za-z0-9_][A-Za-z0-9_-]*)(!?):(?:[ \t]+(.*?))?[ \t]*$").unwrap()
});

static ATTRIBUTE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?\{([A-Za-z0-9_][A-Za-z0-9_-]*)\}").unwrap());

/// Attribute entry line: `:name: value`, `:name!:` or `:!name:`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct AttributeEntry {
    pub name: String,
    /// `None` unsets the attribute.
    pub value: Option<String>,
    /// Value ends with ` \` and continues on the next line.
    pub continued: bool,
}

pub(crate) fn parse_attribute_entry(line: &str) -> Option<AttributeEntry> {
    let caps = ATTRIBUTE_ENTRY.captures(line)?;
    let name = caps[2].to_owned();
    if !caps[1].is_empty() || !caps[3].is_empty() {
        return Some(AttributeEntry {
            name,
            value: None,
            continued: false,
        });
    }

    let raw = caps.get(4).map_or("", |m| m.as_str());
    let (value, continued) = match raw.strip_suffix('\\') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (raw, false),
    };
    Some(AttributeEntry {
        name,
        value: Some(value.to_owned()),
        continued,
    })
}

/// Replace `{name}` with known attribute values.
///
/// Unknown references and escaped `\{name}` are left untouched.
pub(crate) fn substitute<'a>(text: &'a str, attributes: &BTreeMap<String, String>) -> Cow<'a, str> {
    if !text.contains('{') {
        return Cow::Borrowed(text);
    }
    ATTRIBUTE_REFERENCE.replace_all(text, |caps: &regex::Captures<'_>| {
        let whole = &caps[0];
        if whole.starts_with('\\') {
            return whole.to_owned();
        }
        attributes
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| whole.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_parse_set_entry() {
        let entry = parse_attribute_entry(":toc: left").unwrap();
        assert_eq!(entry.name, "toc");
        assert_eq!(entry.value.as_deref(), Some("left"));
        assert!(!entry.continued);
    }

    #[test]
    fn test_parse_empty_value() {
        let entry = parse_attribute_entry(":experimental:").unwrap();
        assert_eq!(entry.value.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_unset_entries() {
        assert_eq!(parse_attribute_entry(":toc!:").unwrap().value, None);
        assert_eq!(parse_attribute_entry(":!toc:").unwrap().value, None);
    }

    #[test]
    fn test_parse_continued_entry() {
        let entry = parse_attribute_entry(":description: first part \\").unwrap();
        assert_eq!(entry.value.as_deref(), Some("first part"));
        assert!(entry.continued);
    }

    #[test]
    fn test_not_an_entry() {
        assert!(parse_attribute_entry("NOTE: text").is_none());
        assert!(parse_attribute_entry(":: text").is_none());
        assert!(parse_attribute_entry("term:: text").is_none());
    }

    #[test]
    fn test_substitute() {
        let attributes = attrs(&[("product", "Widget")]);
        assert_eq!(
            substitute("Use {product} and {unknown}", &attributes),
            "Use Widget and {unknown}"
        );
        assert_eq!(substitute(r"\{product}", &attributes), r"\{product}");
        assert!(matches!(
            substitute("plain", &attributes),
            Cow::Borrowed("plain")
        ));
    }
}
