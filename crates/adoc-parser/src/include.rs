//! `include::` expansion.
//!
//! Includes are expanded before block parsing: each directive is replaced by
//! the resolved lines, and those lines are expanded in turn with the
//! resolved path as their parent. Every line keeps its own file and line
//! number so errors point at the right place.
//!
//! Supported options: `lines`, `tag`/`tags`, `leveloffset`, `indent`,
//! `encoding` and the `optional` flag.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::attributes::parse_block_attributes;
use crate::error::ParseError;
use crate::reader::Line;
use crate::resolver::ContentResolver;
use crate::substitution::{parse_attribute_entry, substitute};

static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\\)?include::([^\[\s][^\[]*)\[(.*)\][ \t]*$").unwrap());

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(tag|end)::([\w.-]+)\[\]").unwrap());

/// Expands includes for one parse call.
pub(crate) struct IncludeExpander<'a> {
    resolver: &'a dyn ContentResolver,
    max_depth: usize,
    /// Attribute entries seen so far, for `{name}` in include targets.
    attributes: BTreeMap<String, String>,
}

impl<'a> IncludeExpander<'a> {
    pub fn new(
        resolver: &'a dyn ContentResolver,
        max_depth: usize,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            resolver,
            max_depth,
            attributes,
        }
    }

    /// Split `source` into lines with every include expanded.
    pub fn expand_source(mut self, source: &str) -> Result<Vec<Line>, ParseError> {
        let lines: Vec<Line> = source
            .lines()
            .enumerate()
            .map(|(i, text)| Line::root(i + 1, text))
            .collect();
        let mut out = Vec::with_capacity(lines.len());
        self.expand(lines, 0, &mut out)?;
        Ok(out)
    }

    fn expand(
        &mut self,
        lines: Vec<Line>,
        depth: usize,
        out: &mut Vec<Line>,
    ) -> Result<(), ParseError> {
        for line in lines {
            if let Some(entry) = parse_attribute_entry(&line.text) {
                match entry.value {
                    Some(value) => {
                        let value = substitute(&value, &self.attributes).into_owned();
                        self.attributes.insert(entry.name, value);
                    }
                    None => {
                        self.attributes.remove(&entry.name);
                    }
                }
            }

            let Some(caps) = INCLUDE_PATTERN.captures(&line.text) else {
                out.push(line);
                continue;
            };
            if caps.get(1).is_some() {
                let text = line.text[1..].to_owned();
                out.push(Line { text, ..line });
                continue;
            }

            let target = substitute(caps[2].trim(), &self.attributes).into_owned();
            let options = parse_block_attributes(&caps[3]);

            if depth >= self.max_depth {
                return Err(line.syntax_error(format!(
                    "include depth exceeded maximum of {}",
                    self.max_depth
                )));
            }

            let parent = line.file.as_deref();
            let Some(resolved) = self
                .resolver
                .resolve(parent, &target, options.get("encoding"))
            else {
                if options.has_option("optional") {
                    tracing::debug!(reference = %target, "Skipping optional include");
                    continue;
                }
                return Err(ParseError::Resolution {
                    line: line.number,
                    file: parent.map(Path::to_path_buf),
                    target,
                });
            };
            tracing::debug!(reference = %target, path = %resolved.path.display(), "Resolved include");

            let mut selected = if let Some(spec) = options.get("lines") {
                select_lines(&resolved.lines, spec)
            } else if let Some(tags) = options.get("tags").or_else(|| options.get("tag")) {
                select_tags(&resolved.lines, tags)
            } else {
                numbered(&resolved.lines)
            };
            if let Some(indent) = options.get("indent").and_then(|i| i.parse::<usize>().ok()) {
                reindent(&mut selected, indent);
            }

            let file: Arc<Path> = Arc::from(resolved.path.as_path());
            let level_offset = apply_level_offset(line.level_offset, options.get("leveloffset"));
            let nested = selected
                .into_iter()
                .map(|(number, text)| Line {
                    text,
                    number,
                    file: Some(Arc::clone(&file)),
                    level_offset,
                })
                .collect();
            self.expand(nested, depth + 1, out)?;
        }
        Ok(())
    }
}

fn numbered(lines: &[String]) -> Vec<(usize, String)> {
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| (i + 1, text.clone()))
        .collect()
}

/// Select 1-based inclusive ranges: `1..3;7`, `2..-1`, `5..`.
fn select_lines(lines: &[String], spec: &str) -> Vec<(usize, String)> {
    let mut keep = vec![false; lines.len()];
    for range in spec.split([';', ',']).map(str::trim).filter(|r| !r.is_empty()) {
        let (start, end) = match range.split_once("..") {
            Some((start, end)) => {
                let start = start.trim().parse::<usize>().unwrap_or(1);
                let end = match end.trim() {
                    "" | "-1" => lines.len(),
                    value => value.parse::<usize>().unwrap_or(lines.len()),
                };
                (start, end)
            }
            None => match range.parse::<usize>() {
                Ok(single) => (single, single),
                Err(_) => continue,
            },
        };
        for index in start.max(1)..=end.min(lines.len()) {
            keep[index - 1] = true;
        }
    }
    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(i, text)| (i + 1, text.clone()))
        .collect()
}

/// Select lines between `tag::name[]` and `end::name[]` markers.
///
/// `*` or `**` selects every line. Marker lines are always dropped.
fn select_tags(lines: &[String], tags: &str) -> Vec<(usize, String)> {
    let wanted: Vec<&str> = tags
        .split([';', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let all = wanted.iter().any(|t| *t == "*" || *t == "**");

    let mut active: Vec<String> = Vec::new();
    let mut selected = Vec::new();
    for (i, text) in lines.iter().enumerate() {
        if let Some(caps) = TAG_PATTERN.captures(text) {
            let name = caps[2].to_owned();
            if &caps[1] == "tag" {
                active.push(name);
            } else if let Some(pos) = active.iter().rposition(|t| *t == name) {
                active.remove(pos);
            }
            continue;
        }
        if all || active.iter().any(|t| wanted.contains(&t.as_str())) {
            selected.push((i + 1, text.clone()));
        }
    }
    selected
}

/// Strip the common indentation and indent by `indent` spaces.
fn reindent(lines: &mut [(usize, String)], indent: usize) {
    let common = lines
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(_, text)| text.len() - text.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    let prefix = " ".repeat(indent);
    for (_, text) in lines.iter_mut() {
        if text.trim().is_empty() {
            text.clear();
        } else {
            *text = format!("{prefix}{}", &text[common..]);
        }
    }
}

/// `+N` and `-N` are relative to the current offset, `N` is absolute.
fn apply_level_offset(current: i32, option: Option<&str>) -> i32 {
    let Some(value) = option.map(str::trim) else {
        return current;
    };
    if let Some(relative) = value.strip_prefix('+') {
        current.saturating_add(relative.parse::<i32>().unwrap_or(0))
    } else if value.starts_with('-') {
        current.saturating_add(value.parse::<i32>().unwrap_or(0))
    } else {
        value.parse::<i32>().unwrap_or(current)
    }
}
