//! Ordered, unordered and description lists.
//!
//! Each marker (`*`, `**`, `-`, `.`, `..`, `::`, `;;`, ...) identifies one
//! list. A line with a marker not seen among the enclosing lists starts a
//! nested list inside the current item; a marker of an enclosing list closes
//! the nested ones.

use std::sync::LazyLock;

use adoc_model::{DescriptionItem, DescriptionList, Element, List, ListItem, Paragraph, Options};
use regex::Regex;

use super::{BlockParser, ends_paragraph};
use crate::error::ParseError;
use crate::reader::{Reader, is_line_comment};

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(\*{1,5}|-|\.{1,5}|\d{1,9}\.)[ \t]+(\S.*)$").unwrap()
});

static DESCRIPTION_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*([^ \t].*?)(:{2,4}|;;)(?:[ \t]+(.*))?$").unwrap()
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum ListMarker {
    Bullet(String),
    Numbered(String),
    Description(String),
}

/// A line starting a list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct ListLine {
    pub marker: ListMarker,
    /// Description list term.
    pub term: Option<String>,
    pub text: String,
    /// Explicit number of `3.` style items.
    pub number: Option<usize>,
}

pub(super) fn list_line(text: &str) -> Option<ListLine> {
    if let Some(caps) = LIST_ITEM.captures(text) {
        let raw = &caps[1];
        let (marker, number) = if raw.starts_with('*') || raw == "-" {
            (ListMarker::Bullet(raw.to_owned()), None)
        } else if raw.starts_with('.') {
            (ListMarker::Numbered(raw.to_owned()), None)
        } else {
            let number = raw.trim_end_matches('.').parse().ok();
            (ListMarker::Numbered(".".to_owned()), number)
        };
        return Some(ListLine {
            marker,
            term: None,
            text: caps[2].to_owned(),
            number,
        });
    }

    let caps = DESCRIPTION_ITEM.captures(text)?;
    Some(ListLine {
        marker: ListMarker::Description(caps[2].to_owned()),
        term: Some(caps[1].trim().to_owned()),
        text: caps.get(3).map_or("", |m| m.as_str()).trim().to_owned(),
        number: None,
    })
}

/// Number of blank lines under the cursor.
fn blank_lines_ahead(reader: &Reader) -> usize {
    let mut offset = 0;
    while reader
        .peek_at(offset)
        .is_some_and(|l| l.text.trim().is_empty())
    {
        offset += 1;
    }
    offset
}

impl BlockParser {
    /// Parse the list starting with `first`, which is still under the cursor.
    pub(super) fn parse_list(
        &mut self,
        reader: &mut Reader,
        first: &ListLine,
        ancestors: &[ListMarker],
    ) -> Result<Element, ParseError> {
        let mut options = self.take_pending();
        if let Some(start) = first.number.filter(|n| *n != 1) {
            options = options.with("start", start.to_string());
        }

        let marker = first.marker.clone();
        let mut lineage = ancestors.to_vec();
        lineage.push(marker.clone());

        let mut items = Vec::new();
        while let Some(item) = reader.peek_text().and_then(list_line) {
            if item.marker != marker {
                break;
            }
            reader.skip();
            let children = self.parse_list_item(reader, &item.text, &lineage)?;
            let term = item.term.map(|t| self.inline(&t));
            items.push((term, children));

            let blanks = blank_lines_ahead(reader);
            let sibling = reader
                .peek_at(blanks)
                .and_then(|l| list_line(&l.text))
                .is_some_and(|next| next.marker == marker);
            if !sibling {
                break;
            }
            for _ in 0..blanks {
                reader.skip();
            }
        }

        Ok(match marker {
            ListMarker::Bullet(_) => Element::UnOrderedList(List {
                items: items
                    .into_iter()
                    .map(|(_, children)| ListItem { children })
                    .collect(),
                options,
            }),
            ListMarker::Numbered(_) => Element::OrderedList(List {
                items: items
                    .into_iter()
                    .map(|(_, children)| ListItem { children })
                    .collect(),
                options,
            }),
            ListMarker::Description(_) => Element::DescriptionList(DescriptionList {
                items: items
                    .into_iter()
                    .map(|(term, description)| DescriptionItem {
                        term: term.unwrap_or_default(),
                        description,
                    })
                    .collect(),
                options,
            }),
        })
    }

    /// Item text with its continuation lines, then attached blocks and
    /// nested lists.
    fn parse_list_item(
        &mut self,
        reader: &mut Reader,
        text: &str,
        lineage: &[ListMarker],
    ) -> Result<Vec<Element>, ParseError> {
        let mut lines = Vec::new();
        if !text.is_empty() {
            lines.push(text.to_owned());
        }
        while let Some(next) = reader.peek_text() {
            if ends_paragraph(next) {
                break;
            }
            if !is_line_comment(next) {
                lines.push(next.trim().to_owned());
            }
            reader.skip();
        }

        let mut children = Vec::new();
        if !lines.is_empty() {
            children.push(Element::Paragraph(Paragraph {
                children: self.inline(&lines.join("\n")),
                options: Options::new(),
            }));
        }

        loop {
            if reader.peek_text().is_some_and(|t| t.trim_end() == "+") {
                reader.skip();
                if let Some(block) = self.parse_attached_block(reader)? {
                    children.push(block);
                }
                continue;
            }

            let blanks = blank_lines_ahead(reader);
            let Some(nested) = reader.peek_at(blanks).and_then(|l| list_line(&l.text)) else {
                break;
            };
            if lineage.contains(&nested.marker) {
                break;
            }
            for _ in 0..blanks {
                reader.skip();
            }
            children.push(self.parse_list(reader, &nested, lineage)?);
        }
        Ok(children)
    }
}
