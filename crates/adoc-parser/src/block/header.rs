//! Document header: title, author and revision lines, attribute entries.

use std::sync::LazyLock;

use adoc_model::{Attribute, Author, Header, Revision};
use regex::Regex;

use super::{BlockParser, continue_entry};
use crate::error::ParseError;
use crate::reader::{Reader, is_line_comment};
use crate::substitution::parse_attribute_entry;

static DOCUMENT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=[ \t]+(\S.*?)[ \t]*$").unwrap());

static AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^<>]+?)(?:[ \t]*<([^<>]+)>)?$").unwrap());

/// Parse `Jane Doe <jane@example.com>; John Roe`.
fn parse_authors(line: &str) -> Vec<Author> {
    line.split(';')
        .map(str::trim)
        .filter_map(|entry| AUTHOR.captures(entry))
        .map(|caps| Author {
            name: caps[1].trim().to_owned(),
            email: caps.get(2).map(|m| m.as_str().trim().to_owned()),
        })
        .collect()
}

/// Parse `v1.0, 2024-01-01: Remark`. A line without a version is a date.
fn parse_revision(line: &str) -> Option<Revision> {
    let line = line.trim();
    let versioned = line
        .strip_prefix('v')
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
    if !versioned && !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let (main, remark) = match line.split_once(':') {
        Some((main, remark)) => (main, Some(remark.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    };
    let (number, date) = match main.split_once(',') {
        Some((number, date)) => (number.trim(), Some(date.trim())),
        None if versioned => (main.trim(), None),
        None => ("", Some(main.trim())),
    };
    Some(Revision {
        number: number.strip_prefix('v').unwrap_or(number).to_owned(),
        date: date.filter(|d| !d.is_empty()).map(str::to_owned),
        remark: remark.map(str::to_owned),
    })
}

fn is_header_text(text: &str) -> bool {
    !text.trim().is_empty()
        && !text.starts_with([':', '[', '.'])
        && !is_line_comment(text)
        && !text.starts_with("////")
}

impl BlockParser {
    /// Parse the header at the start of the document.
    ///
    /// The header ends at the first blank line after the title. Attribute
    /// entries before the title belong to the header as well.
    pub fn parse_header(&mut self, reader: &mut Reader) -> Result<Header, ParseError> {
        let mut header = Header::default();
        reader.skip_blank_lines_and_comments()?;
        self.parse_header_entries(reader, &mut header);

        let Some(title) = reader
            .peek_text()
            .and_then(|t| DOCUMENT_TITLE.captures(t))
            .map(|caps| caps[1].to_owned())
        else {
            return Ok(header);
        };
        reader.skip();
        header.title = self.substitute(&title);
        self.set_intrinsic("doctitle", &header.title);

        if let Some(text) = reader.peek_text().filter(|t| is_header_text(t)) {
            header.authors = parse_authors(text);
            reader.skip();

            if let Some(revision) = reader
                .peek_text()
                .filter(|t| is_header_text(t))
                .and_then(parse_revision)
            {
                header.revision = Some(revision);
                reader.skip();
            }
        }

        if let Some(author) = header.authors.first() {
            self.set_intrinsic("author", &author.name);
            if let Some(email) = &author.email {
                self.set_intrinsic("email", email);
            }
            let names: Vec<&str> = header.authors.iter().map(|a| a.name.as_str()).collect();
            self.set_intrinsic("authors", &names.join(", "));
        }
        if let Some(revision) = &header.revision {
            self.set_intrinsic("revnumber", &revision.number);
            if let Some(date) = &revision.date {
                self.set_intrinsic("revdate", date);
            }
            if let Some(remark) = &revision.remark {
                self.set_intrinsic("revremark", remark);
            }
        }

        self.parse_header_entries(reader, &mut header);
        tracing::debug!(title = %header.title, attributes = header.attributes.len(), "Parsed header");
        Ok(header)
    }

    /// Consume attribute entries and line comments up to the first other line.
    fn parse_header_entries(&mut self, reader: &mut Reader, header: &mut Header) {
        while let Some(text) = reader.peek_text() {
            if is_line_comment(text) {
                reader.skip();
                continue;
            }
            let Some(entry) = parse_attribute_entry(text) else {
                break;
            };
            reader.skip();
            let entry = continue_entry(reader, entry);
            match self.apply_entry(entry) {
                Attribute::Set { name, value } => {
                    header.attributes.insert(name, value);
                }
                Attribute::Unset { name } => {
                    header.attributes.remove(&name);
                }
                Attribute::Reference { .. } => {}
            }
        }
    }

    /// Attributes derived from the header, unless supplied by the caller.
    fn set_intrinsic(&mut self, name: &str, value: &str) {
        if !self.locked.contains(name) {
            self.attributes.insert(name.to_owned(), value.to_owned());
        }
    }
}
