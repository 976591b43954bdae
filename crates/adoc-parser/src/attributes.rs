//! Attribute list parsing.
//!
//! Parses the content of `[...]` in block attribute lines and macros:
//! `[source#id.role%linenums,rust,title="Main, file",opts=header]`.

use adoc_model::Options;

/// Parse a block attribute list.
///
/// The first positional entry may use the `style#id.role%option` shorthand:
/// `source#main.lead,rust` gives `1=source`, `2=rust`, `id=main`, `role=lead`.
pub(crate) fn parse_block_attributes(content: &str) -> Options {
    parse(content, true)
}

/// Parse a macro attribute list such as the `[...]` of `link:url[...]`.
///
/// Without any `=` the whole content is the first positional attribute, so
/// labels may contain commas.
pub(crate) fn parse_macro_attributes(content: &str) -> Options {
    if content.is_empty() {
        return Options::new();
    }
    if !content.contains('=') {
        return Options::new().with("1", content.trim());
    }
    parse(content, false)
}

/// Parse a comma separated list without shorthand, as in `image:x.png[Alt,32,32]`.
pub(crate) fn parse_positional_attributes(content: &str) -> Options {
    parse(content, false)
}

fn parse(content: &str, shorthand: bool) -> Options {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut roles: Vec<String> = Vec::new();

    for (index, raw) in split_entries(content).into_iter().enumerate() {
        let entry = raw.trim();

        if let Some((key, value)) = parse_key_value(entry) {
            match key {
                "opts" | "options" => {
                    for option in value.split(',').map(str::trim).filter(|o| !o.is_empty()) {
                        entries.push((format!("{option}-option"), String::new()));
                    }
                }
                "role" => roles.extend(value.split_whitespace().map(str::to_owned)),
                _ => entries.push((key.to_owned(), value.to_owned())),
            }
            continue;
        }

        let position = (index + 1).to_string();
        if index == 0 && shorthand && !is_quoted(entry) {
            let parsed = Shorthand::parse(entry);
            if !parsed.style.is_empty() {
                entries.push((position, parsed.style.to_owned()));
            }
            if let Some(id) = parsed.id {
                entries.push(("id".to_owned(), id.to_owned()));
            }
            roles.extend(parsed.roles.iter().map(|r| (*r).to_owned()));
            for option in parsed.options {
                entries.push((format!("{option}-option"), String::new()));
            }
        } else if !entry.is_empty() {
            entries.push((position, unquote(entry).to_owned()));
        }
    }

    if !roles.is_empty() {
        entries.push(("role".to_owned(), roles.join(" ")));
    }
    entries.into_iter().collect()
}

/// `style#id.role1.role2%opt1%opt2`.
#[derive(Debug, Default, PartialEq, Eq)]
struct Shorthand<'a> {
    style: &'a str,
    id: Option<&'a str>,
    roles: Vec<&'a str>,
    options: Vec<&'a str>,
}

impl<'a> Shorthand<'a> {
    fn parse(entry: &'a str) -> Self {
        let mut shorthand = Self::default();
        let style_end = entry.find(['#', '.', '%']).unwrap_or(entry.len());
        shorthand.style = &entry[..style_end];

        let mut remaining = &entry[style_end..];
        while let Some(marker) = remaining.chars().next() {
            let rest = &remaining[1..];
            let end = rest.find(['#', '.', '%']).unwrap_or(rest.len());
            let value = &rest[..end];
            if !value.is_empty() {
                match marker {
                    '#' => shorthand.id = Some(value),
                    '.' => shorthand.roles.push(value),
                    _ => shorthand.options.push(value),
                }
            }
            remaining = &rest[end..];
        }
        shorthand
    }
}

/// Split on commas outside of quotes.
fn split_entries(content: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, ',') => {
                entries.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < content.len() || content.ends_with(',') {
        entries.push(&content[start..]);
    }
    entries
}

/// Parse `key=value`, `key="value"` or `key='value'`.
fn parse_key_value(entry: &str) -> Option<(&str, &str)> {
    if is_quoted(entry) {
        return None;
    }
    let eq_pos = entry.find('=')?;
    let key = entry[..eq_pos].trim();
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((key, unquote(entry[eq_pos + 1..].trim())))
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
}

fn unquote(value: &str) -> &str {
    if is_quoted(value) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
