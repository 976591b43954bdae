//! Inline parsing.
//!
//! Turns the text of a paragraph, title or cell into inline elements:
//! emphasis spans, inline code, passthroughs, line breaks, macros, links,
//! cross references and unresolved attribute references.
//!
//! Parsing never fails. A delimiter without a match is kept as literal text,
//! and when two spans could apply, the one starting first wins.

use std::sync::LazyLock;

use adoc_model::{
    Anchor, Attribute, Code, Element, Link, Macro, Marker, Options, Text, TextContent, TextStyle,
};
use regex::Regex;

use crate::attributes::{parse_block_attributes, parse_macro_attributes, parse_positional_attributes};

static MACRO_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z][a-z0-9_-]*):([^\s\[\]]*)\[").unwrap());

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:https?|ftp|irc)://[^\s\[\]<>"]+"#).unwrap());

static ATTRIBUTE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([A-Za-z0-9_][A-Za-z0-9_-]*)\}").unwrap());

static ANCHOR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_:][\w:.-]*$").unwrap());

/// Macros recognized inline. Anything else is plain text.
const INLINE_MACROS: &[&str] = &[
    "anchor",
    "asciimath",
    "btn",
    "footnote",
    "footnoteref",
    "icon",
    "image",
    "kbd",
    "latexmath",
    "link",
    "mailto",
    "menu",
    "pass",
    "stem",
    "xref",
];

/// Attributes that are always defined and replaced by a character.
fn intrinsic(name: &str) -> Option<&'static str> {
    Some(match name {
        "empty" => "",
        "sp" => " ",
        "nbsp" => "\u{a0}",
        "zwsp" => "\u{200b}",
        "wj" => "\u{2060}",
        "apos" => "'",
        "quot" => "\"",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "deg" => "\u{b0}",
        "plus" => "+",
        "brvbar" => "\u{a6}",
        "vbar" => "|",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "startsb" => "[",
        "endsb" => "]",
        "caret" => "^",
        "asterisk" => "*",
        "tilde" => "~",
        "backslash" => "\\",
        "backtick" => "`",
        "two-colons" => "::",
        "two-semicolons" => ";;",
        "cpp" => "C++",
        _ => return None,
    })
}

/// Parse inline markup.
pub(crate) fn parse_inline(text: &str) -> Vec<Element> {
    let mut scanner = Scanner {
        src: text,
        pos: 0,
        pending: String::new(),
        elements: Vec::new(),
    };
    scanner.run();
    scanner.finish()
}

/// Single label element for links and similar constructs.
pub(crate) fn parse_label(text: &str) -> Element {
    let mut children = parse_inline(text);
    if children.len() == 1 {
        return children.remove(0);
    }
    Element::Text(Text::styled(Vec::new(), children, Options::new()))
}

struct Scanner<'t> {
    src: &'t str,
    pos: usize,
    pending: String,
    elements: Vec<Element>,
}

impl<'t> Scanner<'t> {
    fn run(&mut self) {
        let src = self.src;
        while let Some(c) = src[self.pos..].chars().next() {
            let consumed = match c {
                '\\' => self.escape(),
                ' ' => self.line_break(),
                '*' | '_' | '#' | '`' => self.quoted(self.pos, c, Options::new()),
                '^' | '~' => self.simple_span(c),
                '+' => self.passthrough(),
                '<' => self.cross_reference(),
                '[' => self.bracket(),
                '{' => self.attribute_reference(),
                c if c.is_ascii_alphabetic() && self.at_word_boundary(self.pos) => {
                    self.url().or_else(|| self.inline_macro())
                }
                _ => None,
            };
            match consumed {
                Some((element, end)) => {
                    if let Some(element) = element {
                        self.flush();
                        self.elements.push(element);
                    }
                    self.pos = end;
                }
                None => {
                    self.pending.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Element> {
        self.flush();
        self.elements
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.elements.push(Element::text(text));
        }
    }

    fn rest(&self) -> &'t str {
        &self.src[self.pos..]
    }

    fn prev_char(&self, pos: usize) -> Option<char> {
        self.src[..pos].chars().next_back()
    }

    fn at_word_boundary(&self, pos: usize) -> bool {
        self.prev_char(pos).is_none_or(|c| !c.is_alphanumeric() && c != '_')
    }

    /// `\*` keeps the next character literal.
    fn escape(&mut self) -> Option<(Option<Element>, usize)> {
        let next = self.src[self.pos + 1..].chars().next()?;
        if !next.is_ascii_punctuation() && !next.is_ascii_alphabetic() {
            return None;
        }
        self.pending.push(next);
        Some((None, self.pos + 1 + next.len_utf8()))
    }

    /// ` +` at the end of a line.
    fn line_break(&mut self) -> Option<(Option<Element>, usize)> {
        let rest = self.rest();
        let end = if rest.starts_with(" +\n") {
            self.pos + 3
        } else if rest == " +" {
            self.pos + 2
        } else {
            return None;
        };
        Some((Some(Element::LineBreak(Marker::default())), end))
    }

    /// Constrained (`*a*`) and unconstrained (`**a**`) spans starting at `start`.
    fn quoted(&self, start: usize, delim: char, options: Options) -> Option<(Option<Element>, usize)> {
        let rest = &self.src[start..];
        let mut double = String::with_capacity(2);
        double.push(delim);
        double.push(delim);

        if rest.starts_with(&double)
            && let Some(offset) = rest[2..].find(&double)
            && offset > 0
        {
            let content = &rest[2..2 + offset];
            let end = start + 2 + offset + 2;
            return Some((Some(quoted_element(delim, content, options)), end));
        }

        let constrained_start = self
            .prev_char(start)
            .is_none_or(|c| !(c.is_alphanumeric() || matches!(c, '_' | ';' | ':' | '}')));
        let first = rest[1..].chars().next()?;
        if !constrained_start || first.is_whitespace() || first == delim {
            return None;
        }

        let mut search = 1;
        while let Some(offset) = rest[search..].find(delim) {
            let close = search + offset;
            let before = rest[..close].chars().next_back();
            let after = rest[close + 1..].chars().next();
            if before.is_some_and(|c| !c.is_whitespace())
                && after.is_none_or(|c| !c.is_alphanumeric() && c != '_')
            {
                let content = &rest[1..close];
                return Some((Some(quoted_element(delim, content, options)), start + close + 1));
            }
            search = close + 1;
        }
        None
    }

    /// `^super^` and `~sub~`: no whitespace inside.
    fn simple_span(&self, delim: char) -> Option<(Option<Element>, usize)> {
        let rest = self.rest();
        let body = &rest[1..];
        let close = body.find(delim)?;
        let content = &body[..close];
        if content.is_empty() || content.contains(char::is_whitespace) {
            return None;
        }
        let style = if delim == '^' {
            TextStyle::Superscript
        } else {
            TextStyle::Subscript
        };
        let text = Text {
            styles: vec![style],
            ..Text::plain(content)
        };
        Some((Some(Element::Text(text)), self.pos + 1 + close + 1))
    }

    /// `+++raw+++`, `++literal++` and `+literal+`.
    fn passthrough(&self) -> Option<(Option<Element>, usize)> {
        let rest = self.rest();
        if let Some(body) = rest.strip_prefix("+++")
            && let Some(close) = body.find("+++")
        {
            let element = Element::Macro(Macro {
                name: "pass".to_owned(),
                target: body[..close].to_owned(),
                options: Options::new(),
                inline: true,
            });
            return Some((Some(element), self.pos + 3 + close + 3));
        }
        if let Some(body) = rest.strip_prefix("++")
            && let Some(close) = body.find("++")
            && close > 0
        {
            return Some((Some(Element::text(&body[..close])), self.pos + 2 + close + 2));
        }
        if !self.at_word_boundary(self.pos) {
            return None;
        }
        let body = &rest[1..];
        let mut search = 0;
        while let Some(offset) = body[search..].find('+') {
            let close = search + offset;
            let after = body[close + 1..].chars().next();
            if close > 0 && after.is_none_or(|c| !c.is_alphanumeric()) {
                return Some((Some(Element::text(&body[..close])), self.pos + 1 + close + 1));
            }
            search = close + 1;
        }
        None
    }

    /// `<<id>>` and `<<id,label>>`.
    fn cross_reference(&self) -> Option<(Option<Element>, usize)> {
        let body = self.rest().strip_prefix("<<")?;
        let close = body.find(">>")?;
        let inner = &body[..close];
        let (id, label) = match inner.split_once(',') {
            Some((id, label)) => (id.trim(), Some(label.trim())),
            None => (inner.trim(), None),
        };
        if id.is_empty() || id.contains('\n') {
            return None;
        }
        let label = label.filter(|l| !l.is_empty()).map(str::to_owned);
        let element = if id.contains(".adoc") {
            let options = label.map_or_else(Options::new, |l| Options::new().with("1", l));
            Element::Macro(Macro {
                name: "xref".to_owned(),
                target: id.to_owned(),
                options,
                inline: true,
            })
        } else {
            Element::Anchor(Anchor {
                id: id.to_owned(),
                label,
            })
        };
        Some((Some(element), self.pos + 2 + close + 2))
    }

    /// `[[id]]` inline anchors and `[.role]#text#` role spans.
    fn bracket(&self) -> Option<(Option<Element>, usize)> {
        let rest = self.rest();
        if let Some(body) = rest.strip_prefix("[[")
            && let Some(close) = body.find("]]")
        {
            let inner = &body[..close];
            let (id, reftext) = match inner.split_once(',') {
                Some((id, reftext)) => (id.trim(), Some(reftext.trim())),
                None => (inner.trim(), None),
            };
            if ANCHOR_ID.is_match(id) {
                let options =
                    reftext.map_or_else(Options::new, |r| Options::new().with("reftext", r));
                let element = Element::Macro(Macro {
                    name: "anchor".to_owned(),
                    target: id.to_owned(),
                    options,
                    inline: true,
                });
                return Some((Some(element), self.pos + 2 + close + 2));
            }
        }

        let close = rest.find(']')?;
        let inner = &rest[1..close];
        if inner.is_empty() || inner.contains(['[', '\n']) {
            return None;
        }
        let span_start = self.pos + close + 1;
        let delim = self.src[span_start..].chars().next()?;
        if !matches!(delim, '#' | '*' | '_' | '`') {
            return None;
        }
        self.quoted(span_start, delim, parse_block_attributes(inner))
    }

    /// `{name}` that was not substituted while parsing blocks.
    fn attribute_reference(&self) -> Option<(Option<Element>, usize)> {
        let caps = ATTRIBUTE_REFERENCE.captures(self.rest())?;
        let end = self.pos + caps[0].len();
        let name = &caps[1];
        let element = match intrinsic(name) {
            Some(value) => Element::text(value),
            None => Element::Attribute(Attribute::Reference {
                name: name.to_owned(),
            }),
        };
        Some((Some(element), end))
    }

    /// Bare URL with optional `[label]`.
    fn url(&self) -> Option<(Option<Element>, usize)> {
        let m = URL.find(self.rest())?;
        let mut url = m.as_str();
        let after = self.pos + m.end();

        if self.src[after..].starts_with('[')
            && let Some(close) = find_closing_bracket(&self.src[after..])
        {
            let content = &self.src[after + 1..after + close];
            return Some((Some(link(url, content)), after + close + 1));
        }

        url = url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        let end = self.pos + url.len();
        Some((Some(Element::Link(Link::new(url, Options::new()))), end))
    }

    /// `name:target[attributes]`.
    fn inline_macro(&self) -> Option<(Option<Element>, usize)> {
        let rest = self.rest();
        let caps = MACRO_START.captures(rest)?;
        let name = caps.get(1)?.as_str();
        if !INLINE_MACROS.contains(&name) {
            return None;
        }
        let target = caps.get(2)?.as_str();
        let open = caps.get(0)?.end() - 1;
        let close = open + find_closing_bracket(&rest[open..])?;
        let content = rest[open + 1..close].replace("\\]", "]");
        let end = self.pos + close + 1;

        let element = match name {
            "link" if !target.is_empty() => link(target, &content),
            "mailto" if !target.is_empty() => link(&format!("mailto:{target}"), &content),
            "link" | "mailto" => return None,
            "kbd" | "btn" | "pass" | "stem" => Element::Macro(Macro {
                name: name.to_owned(),
                target: content,
                options: Options::new(),
                inline: true,
            }),
            "latexmath" | "asciimath" => Element::Macro(Macro {
                name: "stem".to_owned(),
                target: content,
                options: Options::new().with("notation", name),
                inline: true,
            }),
            "footnote" => {
                let options = if target.is_empty() {
                    Options::new()
                } else {
                    Options::new().with("id", target)
                };
                Element::Macro(Macro {
                    name: "footnote".to_owned(),
                    target: content,
                    options,
                    inline: true,
                })
            }
            "footnoteref" => {
                let (id, text) = content
                    .split_once(',')
                    .map_or((content.as_str(), ""), |(id, text)| (id, text));
                Element::Macro(Macro {
                    name: "footnote".to_owned(),
                    target: text.trim().to_owned(),
                    options: Options::new().with("id", id.trim()),
                    inline: true,
                })
            }
            "image" | "icon" => Element::Macro(Macro {
                name: name.to_owned(),
                target: target.to_owned(),
                options: parse_positional_attributes(&content),
                inline: true,
            }),
            _ => Element::Macro(Macro {
                name: name.to_owned(),
                target: target.to_owned(),
                options: parse_macro_attributes(&content),
                inline: true,
            }),
        };
        Some((Some(element), end))
    }
}

/// Build a link from a URL and its bracket content.
fn link(url: &str, content: &str) -> Element {
    let mut options = parse_macro_attributes(content);
    let mut label = options.positional(1).unwrap_or_default().to_owned();
    if let Some(stripped) = label.strip_suffix('^') {
        label = stripped.to_owned();
        options = options.with("window", "_blank");
    }
    options = options.without("1");
    if label.is_empty() {
        return Element::Link(Link::new(url, options));
    }
    Element::Link(Link::with_label(url, parse_label(&label), options))
}

fn quoted_element(delim: char, content: &str, options: Options) -> Element {
    if delim == '`' {
        return Element::Code(Code {
            options,
            ..Code::inline(content)
        });
    }
    let styles = match delim {
        '*' => vec![TextStyle::Bold],
        '_' => vec![TextStyle::Italic],
        // `[.role]#text#` is a plain span; bare `#text#` is highlighted.
        _ if options.is_empty() => vec![TextStyle::Mark],
        _ => Vec::new(),
    };
    let mut children = parse_inline(content);
    let content = match children.as_mut_slice() {
        [Element::Text(text)] if text.styles.is_empty() && text.options.is_empty() => {
            std::mem::replace(&mut text.content, TextContent::Plain(String::new()))
        }
        _ => TextContent::Nested(children),
    };
    Element::Text(Text {
        styles,
        content,
        options,
    })
}

/// Offset of the `]` matching the `[` at the start of `s`.
///
/// Nested brackets are balanced and `\]` is skipped.
fn find_closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
