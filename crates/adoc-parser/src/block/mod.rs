//! Block-level parsing.
//!
//! The cursor classifies each line by precedence: preprocessor conditionals,
//! block attribute/anchor/title lines, delimited blocks, attribute entries,
//! section headings, block macros, lists, admonition paragraphs, literal
//! paragraphs and finally plain paragraphs.
//!
//! Containers (sections, list items, table cells, delimited and conditional
//! blocks) parse their bodies with the same procedure. Sections share the
//! outer reader and stop at a heading of equal or lower level; delimited
//! blocks and conditionals get a nested reader over their own lines.

mod header;
mod list;
mod table;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use adoc_model::{
    Admonition, AdmonitionKind, Attribute, CallOut, Code, Condition, ConditionalBlock, Element,
    Listing, Macro, Marker, OpenBlock, Options, Paragraph, PassthroughBlock, Quote, Section,
};
use regex::Regex;

use crate::attributes::{parse_block_attributes, parse_positional_attributes};
use crate::error::ParseError;
use crate::expression::parse_expression;
use crate::inline::parse_inline;
use crate::reader::{Line, Reader, is_comment_block_delimiter, is_line_comment};
use crate::substitution::{AttributeEntry, parse_attribute_entry, substitute};

use list::list_line;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(=+)[ \t]+(\S.*?)[ \t]*$").unwrap());

static BLOCK_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[([A-Za-z_:][\w:.-]*)(?:,[ \t]*(.+?))?\]\][ \t]*$").unwrap()
});

static BLOCK_ATTRIBUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[((?:[^\[\]"]|"[^"]*")*)\][ \t]*$"#).unwrap());

static BLOCK_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.([^\s.].*)$").unwrap());

static BLOCK_MACRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(image|video|audio|toc)::([^\[\s]*)\[(.*)\][ \t]*$").unwrap()
});

static CONDITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ifdef|ifndef|ifeval)::([^\[]*)\[(.*)\][ \t]*$").unwrap()
});

static ENDIF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^endif::[^\[]*\[\][ \t]*$").unwrap());

static ADMONITION_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(NOTE|TIP|IMPORTANT|CAUTION|WARNING):[ \t]+(.*)$").unwrap()
});

static CALLOUT_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(\d+|\.)>[ \t]+(.*)$").unwrap());

/// Heading level that closes every open section. Used for blocks attached
/// to list items, which never contain sections.
const NO_SECTIONS: Option<usize> = Some(usize::MAX);

/// Delimited block kinds, keyed by their delimiter line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Delimited {
    Listing,
    Fenced,
    Literal,
    Example,
    Open,
    Quote,
    Passthrough,
    Sidebar,
}

impl Delimited {
    fn detect(text: &str) -> Option<Self> {
        let trimmed = text.trim_end();
        match trimmed {
            "--" => return Some(Self::Open),
            _ if trimmed.starts_with("```") => return Some(Self::Fenced),
            _ => {}
        }
        let first = *trimmed.as_bytes().first()?;
        if trimmed.len() < 4 || !trimmed.bytes().all(|b| b == first) {
            return None;
        }
        match first {
            b'-' => Some(Self::Listing),
            b'.' => Some(Self::Literal),
            b'=' => Some(Self::Example),
            b'_' => Some(Self::Quote),
            b'+' => Some(Self::Passthrough),
            b'*' => Some(Self::Sidebar),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Fenced => "fenced code",
            Self::Literal => "literal",
            Self::Example => "example",
            Self::Open => "open",
            Self::Quote => "quote",
            Self::Passthrough => "passthrough",
            Self::Sidebar => "sidebar",
        }
    }
}

/// Outcome of classifying the line under the cursor.
enum Step {
    Block(Element),
    /// Line consumed without producing a block (attribute list, title, ...).
    Consumed,
    /// Heading that closes the current section.
    Break,
    Eof,
}

/// Block parser state for one `parse` call.
pub(crate) struct BlockParser {
    /// Running attributes used for `{name}` substitution.
    attributes: BTreeMap<String, String>,
    /// Attributes supplied by the caller; document entries do not override them.
    locked: BTreeSet<String>,
    /// Attribute list, anchor and title lines waiting for the next block.
    pending: Options,
}

impl BlockParser {
    pub fn new(attributes: BTreeMap<String, String>) -> Self {
        Self {
            locked: attributes.keys().cloned().collect(),
            attributes,
            pending: Options::new(),
        }
    }

    /// Parse blocks until end of input, or until a heading closes the
    /// section at `section_level`.
    pub fn parse_blocks(
        &mut self,
        reader: &mut Reader,
        section_level: Option<usize>,
    ) -> Result<Vec<Element>, ParseError> {
        let mut elements = Vec::new();
        loop {
            reader.skip_blank_lines_and_comments()?;
            if self.attach_callout(reader, &mut elements) {
                continue;
            }
            match self.parse_next(reader, section_level)? {
                Step::Block(element) => elements.push(element),
                Step::Consumed => {}
                Step::Break => break,
                Step::Eof => {
                    self.pending = Options::new();
                    break;
                }
            }
        }
        Ok(elements)
    }

    fn parse_next(
        &mut self,
        reader: &mut Reader,
        section_level: Option<usize>,
    ) -> Result<Step, ParseError> {
        let Some(line) = reader.peek().cloned() else {
            return Ok(Step::Eof);
        };
        let text = line.text.as_str();

        if let Some(caps) = CONDITIONAL.captures(text) {
            reader.skip();
            return self
                .parse_conditional(reader, &line, &caps[1], caps[2].trim(), &caps[3])
                .map(Step::Block);
        }
        if ENDIF.is_match(text) {
            tracing::warn!(line = line.number, "Ignoring endif without matching conditional");
            reader.skip();
            return Ok(Step::Consumed);
        }

        if let Some(caps) = BLOCK_ANCHOR.captures(text) {
            let mut pending = std::mem::take(&mut self.pending).with("id", &caps[1]);
            if let Some(reftext) = caps.get(2) {
                pending = pending.with("reftext", reftext.as_str());
            }
            self.pending = pending;
            reader.skip();
            return Ok(Step::Consumed);
        }
        if let Some(caps) = BLOCK_ATTRIBUTES.captures(text) {
            let parsed = parse_block_attributes(&self.substitute(&caps[1]));
            self.pending = self.pending.merged(&parsed);
            reader.skip();
            return Ok(Step::Consumed);
        }
        if let Some(caps) = BLOCK_TITLE.captures(text) {
            let title = self.substitute(&caps[1]);
            self.pending = std::mem::take(&mut self.pending).with("title", title);
            reader.skip();
            return Ok(Step::Consumed);
        }

        if let Some(kind) = Delimited::detect(text) {
            reader.skip();
            return self.parse_delimited(reader, &line, kind).map(Step::Block);
        }
        if is_table_delimiter(text) {
            reader.skip();
            let options = self.take_pending();
            return self.parse_table(reader, &line, options).map(Step::Block);
        }

        if let Some(entry) = parse_attribute_entry(text) {
            reader.skip();
            let entry = continue_entry(reader, entry);
            let attribute = self.apply_entry(entry);
            return Ok(Step::Block(Element::Attribute(attribute)));
        }

        if let Some(caps) = HEADING.captures(text) {
            let level = heading_level(caps[1].len(), line.level_offset);
            if section_level.is_some_and(|current| level <= current) {
                return Ok(Step::Break);
            }
            reader.skip();
            return self.parse_section(reader, level, &caps[2]).map(Step::Block);
        }

        if let Some(caps) = BLOCK_MACRO.captures(text) {
            let attributes = parse_positional_attributes(&self.substitute(&caps[3]));
            let element = Element::Macro(Macro {
                name: caps[1].to_owned(),
                target: self.substitute(&caps[2]),
                options: self.take_pending().merged(&attributes),
                inline: false,
            });
            reader.skip();
            return Ok(Step::Block(element));
        }

        match text.trim_end() {
            "<<<" => {
                reader.skip();
                let options = self.take_pending();
                return Ok(Step::Block(Element::PageBreak(Marker { options })));
            }
            "'''" => {
                reader.skip();
                return Ok(Step::Block(Element::Macro(Macro {
                    name: "thematic-break".to_owned(),
                    target: String::new(),
                    options: self.take_pending(),
                    inline: false,
                })));
            }
            _ => {}
        }

        if let Some(item) = list_line(text) {
            return self.parse_list(reader, &item, &[]).map(Step::Block);
        }

        if let Some(caps) = ADMONITION_PARAGRAPH.captures(text) {
            let kind = AdmonitionKind::from_label(&caps[1]);
            reader.skip();
            let mut lines = vec![caps[2].to_owned()];
            lines.extend(collect_paragraph(reader));
            let options = self.take_pending();
            let paragraph = Element::Paragraph(self.paragraph(&lines, &options));
            let element = match kind {
                Some(kind) => Element::Admonition(Admonition {
                    kind,
                    children: vec![paragraph],
                    options,
                }),
                None => paragraph,
            };
            return Ok(Step::Block(element));
        }

        if text.starts_with([' ', '\t']) {
            return Ok(Step::Block(self.parse_literal_paragraph(reader)));
        }

        reader.skip();
        let mut lines = vec![line.text.clone()];
        lines.extend(collect_paragraph(reader));
        let options = self.take_pending();
        Ok(Step::Block(self.styled_paragraph(lines, options)))
    }

    fn take_pending(&mut self) -> Options {
        std::mem::take(&mut self.pending)
    }

    fn substitute(&self, text: &str) -> String {
        substitute(text, &self.attributes).into_owned()
    }

    /// Inline elements of `text` after attribute substitution.
    fn inline(&self, text: &str) -> Vec<Element> {
        parse_inline(&substitute(text, &self.attributes))
    }

    fn parse_nested(&mut self, lines: Vec<Line>) -> Result<Vec<Element>, ParseError> {
        let mut nested = Reader::new(lines);
        self.parse_blocks(&mut nested, None)
    }

    /// Parse the single block following a `+` list continuation line.
    fn parse_attached_block(&mut self, reader: &mut Reader) -> Result<Option<Element>, ParseError> {
        loop {
            if reader.peek_text().is_none_or(|t| t.trim().is_empty()) {
                return Ok(None);
            }
            match self.parse_next(reader, NO_SECTIONS)? {
                Step::Block(element) => return Ok(Some(element)),
                Step::Consumed => {}
                Step::Break | Step::Eof => return Ok(None),
            }
        }
    }

    pub(crate) fn apply_entry(&mut self, entry: AttributeEntry) -> Attribute {
        let locked = self.locked.contains(&entry.name);
        match entry.value {
            Some(value) => {
                let value = self.substitute(&value);
                if !locked {
                    self.attributes.insert(entry.name.clone(), value.clone());
                }
                Attribute::Set {
                    name: entry.name,
                    value,
                }
            }
            None => {
                if !locked {
                    self.attributes.remove(&entry.name);
                }
                Attribute::Unset { name: entry.name }
            }
        }
    }

    fn parse_section(
        &mut self,
        reader: &mut Reader,
        level: usize,
        title: &str,
    ) -> Result<Element, ParseError> {
        let options = self.take_pending();
        let title = self.inline(title);
        let children = self.parse_blocks(reader, Some(level))?;
        Ok(Element::Section(Section {
            level,
            title,
            children,
            options,
        }))
    }

    fn parse_delimited(
        &mut self,
        reader: &mut Reader,
        opening: &Line,
        kind: Delimited,
    ) -> Result<Element, ParseError> {
        let mut options = self.take_pending();
        let delimiter = match kind {
            Delimited::Fenced => "```",
            _ => opening.text.trim_end(),
        };
        let lines = reader.read_until_delimiter(opening, delimiter, kind.name())?;

        let element = match kind {
            Delimited::Fenced => {
                let language = opening
                    .text
                    .trim()
                    .strip_prefix("```")
                    .map(str::trim)
                    .filter(|l| !l.is_empty());
                if let Some(language) = language {
                    options = options.with("1", "source").with("2", language);
                }
                self.verbatim_block(lines.into_iter().map(|l| l.text).collect(), options)
            }
            Delimited::Listing => {
                self.verbatim_block(lines.into_iter().map(|l| l.text).collect(), options)
            }
            Delimited::Literal => {
                if options.positional(1).is_none() {
                    options = options.with("1", "literal");
                }
                self.verbatim_block(lines.into_iter().map(|l| l.text).collect(), options)
            }
            Delimited::Passthrough => Element::PassthroughBlock(PassthroughBlock {
                content: lines
                    .into_iter()
                    .map(|l| l.text)
                    .collect::<Vec<_>>()
                    .join("\n"),
                options,
            }),
            Delimited::Quote => {
                let children = self.parse_nested(lines)?;
                Element::Quote(Quote {
                    attribution: options.positional(2).map(str::to_owned),
                    citetitle: options.positional(3).map(str::to_owned),
                    children,
                    options,
                })
            }
            Delimited::Example | Delimited::Sidebar | Delimited::Open => {
                let children = self.parse_nested(lines)?;
                compound_block(kind, children, options)
            }
        };
        Ok(element)
    }

    /// Code block, or listing block for styles other than `source`.
    fn verbatim_block(&self, lines: Vec<String>, options: Options) -> Element {
        match options.positional(1) {
            None | Some("source") => {
                let language = options
                    .positional(2)
                    .or_else(|| {
                        options
                            .positional(1)
                            .and_then(|_| self.attributes.get("source-language"))
                            .map(String::as_str)
                    })
                    .map(str::to_owned);
                Element::Code(Code {
                    language,
                    lines: number_callouts(lines),
                    callouts: Vec::new(),
                    inline: false,
                    options,
                })
            }
            Some(style) => Element::Listing(Listing {
                style: Some(style.to_owned()),
                lines,
                options,
            }),
        }
    }

    /// Attach a `<1> text` line to the code block before it.
    fn attach_callout(&self, reader: &mut Reader, elements: &mut [Element]) -> bool {
        let Some(Element::Code(code)) = elements.last_mut() else {
            return false;
        };
        let Some((marker, text)) = reader.peek_text().and_then(|t| {
            CALLOUT_ITEM
                .captures(t)
                .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
        }) else {
            return false;
        };
        let number = marker
            .parse()
            .unwrap_or_else(|_| code.callouts.len() + 1);
        code.callouts.push(CallOut {
            number,
            text: self.inline(&text),
        });
        reader.skip();
        true
    }

    fn parse_literal_paragraph(&mut self, reader: &mut Reader) -> Element {
        let mut lines = Vec::new();
        while let Some(text) = reader.peek_text() {
            if text.trim().is_empty() {
                break;
            }
            lines.push(text.to_owned());
            reader.skip();
        }
        let indent = lines
            .iter()
            .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0);
        let lines = lines.into_iter().map(|l| l[indent..].to_owned()).collect();

        let mut options = self.take_pending();
        if options.positional(1).is_none() {
            options = options.with("1", "literal");
        }
        self.verbatim_block(lines, options)
    }

    /// Paragraph over `lines`. `options` are only read for `%hardbreaks`.
    fn paragraph(&self, lines: &[String], options: &Options) -> Paragraph {
        let hardbreaks =
            options.has_option("hardbreaks") || self.attributes.contains_key("hardbreaks-option");
        let joined = lines.join(if hardbreaks { " +\n" } else { "\n" });
        Paragraph {
            children: self.inline(&joined),
            options: Options::new(),
        }
    }

    /// Paragraph, or the block its style turns it into.
    fn styled_paragraph(&self, lines: Vec<String>, options: Options) -> Element {
        let style = options.positional(1).unwrap_or_default().to_owned();
        if let Some(kind) = AdmonitionKind::from_label(&style) {
            return Element::Admonition(Admonition {
                kind,
                children: vec![Element::Paragraph(self.paragraph(&lines, &options))],
                options,
            });
        }
        match style.as_str() {
            "source" | "listing" | "literal" => self.verbatim_block(lines, options),
            "pass" | "stem" | "latexmath" | "asciimath" => {
                Element::PassthroughBlock(PassthroughBlock {
                    content: lines.join("\n"),
                    options,
                })
            }
            "quote" | "verse" => Element::Quote(Quote {
                attribution: options.positional(2).map(str::to_owned),
                citetitle: options.positional(3).map(str::to_owned),
                children: vec![Element::Paragraph(self.paragraph(&lines, &options))],
                options,
            }),
            "example" | "sidebar" | "abstract" | "partintro" => Element::OpenBlock(OpenBlock {
                children: vec![Element::Paragraph(self.paragraph(&lines, &options))],
                options,
            }),
            _ => {
                let paragraph = self.paragraph(&lines, &options);
                Element::Paragraph(Paragraph {
                    options,
                    ..paragraph
                })
            }
        }
    }

    fn parse_conditional(
        &mut self,
        reader: &mut Reader,
        opening: &Line,
        directive: &str,
        target: &str,
        content: &str,
    ) -> Result<Element, ParseError> {
        let condition = match directive {
            "ifeval" => parse_expression(content).map(Condition::Ifeval).ok_or_else(|| {
                opening.syntax_error(format!("invalid ifeval expression '{content}'"))
            })?,
            _ if target.is_empty() => {
                return Err(opening.syntax_error(format!("{directive} requires an attribute name")));
            }
            "ifdef" => Condition::Ifdef(target.to_owned()),
            _ => Condition::Ifndef(target.to_owned()),
        };

        let lines = if directive != "ifeval" && !content.is_empty() {
            vec![Line {
                text: content.to_owned(),
                ..opening.clone()
            }]
        } else {
            read_conditional_body(reader, opening)?
        };
        let children = self.parse_nested(lines)?;
        Ok(Element::ConditionalBlock(ConditionalBlock {
            condition,
            children,
            options: Options::new(),
        }))
    }
}

fn compound_block(kind: Delimited, children: Vec<Element>, mut options: Options) -> Element {
    if let Some(admonition) = options.positional(1).and_then(AdmonitionKind::from_label) {
        return Element::Admonition(Admonition {
            kind: admonition,
            children,
            options,
        });
    }
    let default_style = match kind {
        Delimited::Example => Some("example"),
        Delimited::Sidebar => Some("sidebar"),
        _ => None,
    };
    if let Some(style) = default_style
        && options.positional(1).is_none()
    {
        options = options.with("1", style);
    }
    Element::OpenBlock(OpenBlock { children, options })
}

/// Lines of a multi-line conditional up to its matching `endif`.
fn read_conditional_body(reader: &mut Reader, opening: &Line) -> Result<Vec<Line>, ParseError> {
    let mut depth = 0usize;
    let mut body = Vec::new();
    loop {
        let Some(line) = reader.next() else {
            return Err(opening.syntax_error("unterminated conditional block"));
        };
        if ENDIF.is_match(&line.text) {
            if depth == 0 {
                return Ok(body);
            }
            depth -= 1;
        } else if let Some(caps) = CONDITIONAL.captures(&line.text)
            && (&caps[1] == "ifeval" || caps[3].is_empty())
        {
            depth += 1;
        }
        body.push(line);
    }
}

/// Append continuation lines of an attribute entry ending with ` \`.
fn continue_entry(reader: &mut Reader, mut entry: AttributeEntry) -> AttributeEntry {
    while entry.continued {
        let Some(next) = reader.peek_text() else {
            break;
        };
        let trimmed = next.trim();
        let (part, more) = match trimmed.strip_suffix('\\') {
            Some(stripped) => (stripped.trim_end(), true),
            None => (trimmed, false),
        };
        if let Some(value) = entry.value.as_mut() {
            if !value.is_empty() && !part.is_empty() {
                value.push(' ');
            }
            value.push_str(part);
        }
        entry.continued = more;
        reader.skip();
    }
    entry
}

fn is_table_delimiter(text: &str) -> bool {
    text.trim_end() == "|==="
}

fn heading_level(markers: usize, offset: i32) -> usize {
    isize::try_from(offset)
        .ok()
        .and_then(|offset| markers.checked_add_signed(offset))
        .filter(|level| *level >= 1)
        .unwrap_or(1)
}

/// Whether `text` ends a paragraph.
fn ends_paragraph(text: &str) -> bool {
    text.trim().is_empty()
        || text.trim_end() == "+"
        || Delimited::detect(text).is_some()
        || is_table_delimiter(text)
        || HEADING.is_match(text)
        || CONDITIONAL.is_match(text)
        || ENDIF.is_match(text)
        || BLOCK_ANCHOR.is_match(text)
        || is_comment_block_delimiter(text)
        || parse_attribute_entry(text).is_some()
        || list_line(text).is_some()
}

/// Remaining lines of a paragraph whose first line is already consumed.
fn collect_paragraph(reader: &mut Reader) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(text) = reader.peek_text() {
        if ends_paragraph(text) {
            break;
        }
        if !is_line_comment(text) {
            lines.push(text.to_owned());
        }
        reader.skip();
    }
    lines
}

/// Replace `<.>` markers at the end of code lines with sequential numbers.
fn number_callouts(lines: Vec<String>) -> Vec<String> {
    if !lines.iter().any(|l| l.contains("<.>")) {
        return lines;
    }
    let mut next = 0usize;
    lines
        .into_iter()
        .map(|line| {
            if !line.trim_end().ends_with("<.>") {
                return line;
            }
            let mut out = String::with_capacity(line.len());
            let mut rest = line.as_str();
            while let Some(pos) = rest.find("<.>") {
                next += 1;
                out.push_str(&rest[..pos]);
                out.push('<');
                out.push_str(&next.to_string());
                out.push('>');
                rest = &rest[pos + 3..];
            }
            out.push_str(rest);
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adoc_model::{Anchor, ElementKind};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Element> {
        let mut reader = Reader::from_text(source, 1);
        BlockParser::new(BTreeMap::new())
            .parse_blocks(&mut reader, None)
            .unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        let mut reader = Reader::from_text(source, 1);
        BlockParser::new(BTreeMap::new())
            .parse_blocks(&mut reader, None)
            .unwrap_err()
    }

    fn kinds(elements: &[Element]) -> Vec<ElementKind> {
        elements.iter().map(Element::kind).collect()
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let elements = parse("first line\nsecond line\n\nnext paragraph");
        assert_eq!(kinds(&elements), vec![ElementKind::Paragraph, ElementKind::Paragraph]);
        let Element::Paragraph(p) = &elements[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children, vec![Element::text("first line\nsecond line")]);
    }

    #[test]
    fn test_section_nesting_uses_stack_discipline() {
        let elements = parse("== A\n\n=== A.1\n\ntext\n\n== B\n\n==== B.x\n");
        assert_eq!(elements.len(), 2);
        let Element::Section(a) = &elements[0] else {
            panic!("expected section");
        };
        assert_eq!(a.level, 2);
        assert_eq!(kinds(&a.children), vec![ElementKind::Section]);
        let Element::Section(b) = &elements[1] else {
            panic!("expected section");
        };
        assert_eq!(b.title, vec![Element::text("B")]);
        assert_eq!(kinds(&b.children), vec![ElementKind::Section]);
    }

    #[test]
    fn test_section_options_from_attribute_lines() {
        let elements = parse("[#custom.big]\n== Title\n");
        let Element::Section(section) = &elements[0] else {
            panic!("expected section");
        };
        assert_eq!(section.options.id(), Some("custom"));
        assert_eq!(section.options.role(), Some("big"));
    }

    #[test]
    fn test_anchor_line_before_closing_heading() {
        let elements = parse("== A\n\ntext\n\n[[b]]\n== B\n");
        let Element::Section(b) = &elements[1] else {
            panic!("expected section");
        };
        assert_eq!(b.options.id(), Some("b"));
    }

    #[test]
    fn test_source_block() {
        let elements = parse("[source,rust]\n.Main\n----\nfn main() {}\n----");
        let [Element::Code(code)] = elements.as_slice() else {
            panic!("expected code, got {elements:?}");
        };
        assert_eq!(code.language.as_deref(), Some("rust"));
        assert_eq!(code.lines, vec!["fn main() {}".to_owned()]);
        assert_eq!(code.options.title(), Some("Main"));
        assert!(!code.inline);
    }

    #[test]
    fn test_fenced_block() {
        let elements = parse("```python\nprint(1)\n```");
        let [Element::Code(code)] = elements.as_slice() else {
            panic!("expected code");
        };
        assert_eq!(code.language.as_deref(), Some("python"));
    }

    #[test]
    fn test_callouts_attach_to_code() {
        let elements = parse("----\nlet x = 1; <.>\nlet y = 2; <.>\n----\n<.> first\n<.> second");
        let [Element::Code(code)] = elements.as_slice() else {
            panic!("expected code, got {elements:?}");
        };
        assert_eq!(code.lines[0], "let x = 1; <1>");
        assert_eq!(code.lines[1], "let y = 2; <2>");
        assert_eq!(code.callouts.len(), 2);
        assert_eq!(code.callouts[1].number, 2);
        assert_eq!(code.callouts[1].text, vec![Element::text("second")]);
    }

    #[test]
    fn test_literal_block_and_indented_paragraph() {
        let elements = parse("....\n  raw *text*\n....\n\n  indented\n    more");
        let [Element::Listing(block), Element::Listing(indented)] = elements.as_slice() else {
            panic!("expected listings, got {elements:?}");
        };
        assert_eq!(block.style.as_deref(), Some("literal"));
        assert_eq!(block.lines, vec!["  raw *text*".to_owned()]);
        assert_eq!(indented.lines, vec!["indented".to_owned(), "  more".to_owned()]);
    }

    #[test]
    fn test_unterminated_listing_is_syntax_error() {
        let error = parse_err("text\n\n----\ncode");
        assert_eq!(error.line(), 3);
        assert!(error.to_string().contains("unterminated listing block"));
    }

    #[test]
    fn test_example_block_and_admonition_style() {
        let elements = parse("====\ninside\n====\n\n[WARNING]\n====\ncareful\n====");
        let Element::OpenBlock(example) = &elements[0] else {
            panic!("expected open block");
        };
        assert_eq!(example.options.positional(1), Some("example"));
        let Element::Admonition(admonition) = &elements[1] else {
            panic!("expected admonition");
        };
        assert_eq!(admonition.kind, AdmonitionKind::Warning);
    }

    #[test]
    fn test_admonition_paragraph() {
        let elements = parse("TIP: Use *this*.\nSecond line.");
        let [Element::Admonition(admonition)] = elements.as_slice() else {
            panic!("expected admonition");
        };
        assert_eq!(admonition.kind, AdmonitionKind::Tip);
        assert_eq!(kinds(&admonition.children), vec![ElementKind::Paragraph]);
    }

    #[test]
    fn test_quote_block() {
        let elements = parse("[quote,Ada Lovelace,Notes]\n____\nThe engine.\n____");
        let [Element::Quote(quote)] = elements.as_slice() else {
            panic!("expected quote");
        };
        assert_eq!(quote.attribution.as_deref(), Some("Ada Lovelace"));
        assert_eq!(quote.citetitle.as_deref(), Some("Notes"));
        assert_eq!(kinds(&quote.children), vec![ElementKind::Paragraph]);
    }

    #[test]
    fn test_passthrough_block_keeps_raw_content() {
        let elements = parse("++++\n<video src=\"a\">\n++++");
        assert_eq!(
            elements,
            vec![Element::PassthroughBlock(PassthroughBlock {
                content: "<video src=\"a\">".to_owned(),
                options: Options::new(),
            })]
        );
    }

    #[test]
    fn test_attribute_entries_substitute_later_text() {
        let elements = parse(":product: Widget\n\nAbout {product} and {other}.");
        assert_eq!(
            elements[0],
            Element::Attribute(Attribute::Set {
                name: "product".to_owned(),
                value: "Widget".to_owned(),
            })
        );
        let Element::Paragraph(p) = &elements[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children[0], Element::text("About Widget and "));
        assert!(matches!(
            &p.children[1],
            Element::Attribute(Attribute::Reference { name }) if name == "other"
        ));
    }

    #[test]
    fn test_locked_attributes_win() {
        let mut reader = Reader::from_text(":product: Doc\n\n{product}", 1);
        let attributes = BTreeMap::from([("product".to_owned(), "Cli".to_owned())]);
        let elements = BlockParser::new(attributes)
            .parse_blocks(&mut reader, None)
            .unwrap();
        let Element::Paragraph(p) = &elements[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children, vec![Element::text("Cli")]);
    }

    #[test]
    fn test_conditional_block() {
        let elements = parse("ifdef::flag[]\nshown\nendif::flag[]\nafter");
        let Element::ConditionalBlock(block) = &elements[0] else {
            panic!("expected conditional");
        };
        assert_eq!(block.condition, Condition::Ifdef("flag".to_owned()));
        assert_eq!(kinds(&block.children), vec![ElementKind::Paragraph]);
        assert_eq!(kinds(&elements[1..]), vec![ElementKind::Paragraph]);
    }

    #[test]
    fn test_nested_conditionals() {
        let elements =
            parse("ifndef::a[]\nifdef::b[]\ninner\nendif::b[]\nouter\nendif::a[]\n\nafter");
        assert_eq!(elements.len(), 2);
        let Element::ConditionalBlock(outer) = &elements[0] else {
            panic!("expected conditional");
        };
        assert_eq!(
            kinds(&outer.children),
            vec![ElementKind::ConditionalBlock, ElementKind::Paragraph]
        );
    }

    #[test]
    fn test_single_line_conditional() {
        let elements = parse("ifdef::env-github[Rendered on GitHub.]");
        let Element::ConditionalBlock(block) = &elements[0] else {
            panic!("expected conditional");
        };
        assert_eq!(kinds(&block.children), vec![ElementKind::Paragraph]);
    }

    #[test]
    fn test_ifeval() {
        let elements = parse("ifeval::[{level} > 1]\ndeep\nendif::[]");
        assert!(matches!(&elements[0], Element::ConditionalBlock(b)
            if matches!(b.condition, Condition::Ifeval(_))));
    }

    #[test]
    fn test_conditional_errors() {
        assert!(parse_err("ifdef::x[]\nnever closed").to_string().contains("unterminated"));
        assert!(parse_err("ifeval::[nonsense]\nx\nendif::[]").to_string().contains("ifeval"));
    }

    #[test]
    fn test_stray_endif_is_skipped() {
        assert_eq!(kinds(&parse("endif::x[]\ntext")), vec![ElementKind::Paragraph]);
    }

    #[test]
    fn test_block_macros() {
        let elements = parse(".Logo\nimage::logo.png[Company logo,200]\n\ntoc::[]");
        let Element::Macro(image) = &elements[0] else {
            panic!("expected macro");
        };
        assert_eq!(image.name, "image");
        assert_eq!(image.target, "logo.png");
        assert_eq!(image.options.positional(1), Some("Company logo"));
        assert_eq!(image.options.title(), Some("Logo"));
        assert!(!image.inline);
        assert!(matches!(&elements[1], Element::Macro(m) if m.name == "toc"));
    }

    #[test]
    fn test_breaks() {
        assert_eq!(
            kinds(&parse("<<<\n\n'''")),
            vec![ElementKind::PageBreak, ElementKind::Macro]
        );
    }

    #[test]
    fn test_paragraph_stops_at_list() {
        let elements = parse("Intro:\n* one\n* two");
        assert_eq!(
            kinds(&elements),
            vec![ElementKind::Paragraph, ElementKind::UnOrderedList]
        );
    }

    #[test]
    fn test_inline_xref_in_paragraph() {
        let elements = parse("See <<intro>>.");
        let Element::Paragraph(p) = &elements[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            p.children[1],
            Element::Anchor(Anchor {
                id: "intro".to_owned(),
                label: None,
            })
        );
    }

    #[test]
    fn test_hardbreaks_option() {
        let elements = parse("[%hardbreaks]\none\ntwo");
        let Element::Paragraph(p) = &elements[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(kinds(&p.children), vec![
            ElementKind::Text,
            ElementKind::LineBreak,
            ElementKind::Text,
        ]);
    }

    #[test]
    fn test_heading_level_offset() {
        assert_eq!(heading_level(2, 1), 3);
        assert_eq!(heading_level(2, -5), 1);
    }
}
