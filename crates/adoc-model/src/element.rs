//! Document tree nodes.

use crate::condition::Condition;
use crate::options::Options;

/// One node of the document tree.
///
/// The set of variants is closed; renderers match on it exhaustively.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Element {
    Text(Text),
    Paragraph(Paragraph),
    Section(Section),
    LineBreak(Marker),
    PageBreak(Marker),
    Code(Code),
    Listing(Listing),
    UnOrderedList(List),
    OrderedList(List),
    DescriptionList(DescriptionList),
    Link(Link),
    Macro(Macro),
    Admonition(Admonition),
    Anchor(Anchor),
    Table(Table),
    Quote(Quote),
    OpenBlock(OpenBlock),
    PassthroughBlock(PassthroughBlock),
    ConditionalBlock(ConditionalBlock),
    Attribute(Attribute),
}

/// Discriminant of [`Element`].
///
/// Only meaningful inside one process; not part of the serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Text,
    Paragraph,
    Section,
    LineBreak,
    PageBreak,
    Code,
    Listing,
    UnOrderedList,
    OrderedList,
    DescriptionList,
    Link,
    Macro,
    Admonition,
    Anchor,
    Table,
    Quote,
    OpenBlock,
    PassthroughBlock,
    ConditionalBlock,
    Attribute,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Text(_) => ElementKind::Text,
            Self::Paragraph(_) => ElementKind::Paragraph,
            Self::Section(_) => ElementKind::Section,
            Self::LineBreak(_) => ElementKind::LineBreak,
            Self::PageBreak(_) => ElementKind::PageBreak,
            Self::Code(_) => ElementKind::Code,
            Self::Listing(_) => ElementKind::Listing,
            Self::UnOrderedList(_) => ElementKind::UnOrderedList,
            Self::OrderedList(_) => ElementKind::OrderedList,
            Self::DescriptionList(_) => ElementKind::DescriptionList,
            Self::Link(_) => ElementKind::Link,
            Self::Macro(_) => ElementKind::Macro,
            Self::Admonition(_) => ElementKind::Admonition,
            Self::Anchor(_) => ElementKind::Anchor,
            Self::Table(_) => ElementKind::Table,
            Self::Quote(_) => ElementKind::Quote,
            Self::OpenBlock(_) => ElementKind::OpenBlock,
            Self::PassthroughBlock(_) => ElementKind::PassthroughBlock,
            Self::ConditionalBlock(_) => ElementKind::ConditionalBlock,
            Self::Attribute(_) => ElementKind::Attribute,
        }
    }

    /// Options attached to the element, if the variant carries any.
    pub fn options(&self) -> Option<&Options> {
        match self {
            Self::Text(e) => Some(&e.options),
            Self::Paragraph(e) => Some(&e.options),
            Self::Section(e) => Some(&e.options),
            Self::LineBreak(e) | Self::PageBreak(e) => Some(&e.options),
            Self::Code(e) => Some(&e.options),
            Self::Listing(e) => Some(&e.options),
            Self::UnOrderedList(e) | Self::OrderedList(e) => Some(&e.options),
            Self::DescriptionList(e) => Some(&e.options),
            Self::Link(e) => Some(&e.options),
            Self::Macro(e) => Some(&e.options),
            Self::Admonition(e) => Some(&e.options),
            Self::Table(e) => Some(&e.options),
            Self::Quote(e) => Some(&e.options),
            Self::OpenBlock(e) => Some(&e.options),
            Self::PassthroughBlock(e) => Some(&e.options),
            Self::ConditionalBlock(e) => Some(&e.options),
            Self::Anchor(_) | Self::Attribute(_) => None,
        }
    }

    /// Plain text element.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Text::plain(value))
    }

    /// Visit this element and every element nested below it, in document order.
    ///
    /// Section titles, list items, description terms, table cells, link
    /// labels and call-out texts are all visited. Conditional blocks are
    /// descended into regardless of their predicate.
    pub fn walk(&self, f: &mut dyn FnMut(&Element)) {
        f(self);
        match self {
            Self::Text(text) => {
                if let TextContent::Nested(children) = &text.content {
                    walk_all(children, f);
                }
            }
            Self::Paragraph(p) => walk_all(&p.children, f),
            Self::Section(section) => {
                walk_all(&section.title, f);
                walk_all(&section.children, f);
            }
            Self::Code(code) => {
                for callout in &code.callouts {
                    walk_all(&callout.text, f);
                }
            }
            Self::UnOrderedList(list) | Self::OrderedList(list) => {
                for item in &list.items {
                    walk_all(&item.children, f);
                }
            }
            Self::DescriptionList(list) => {
                for item in &list.items {
                    walk_all(&item.term, f);
                    walk_all(&item.description, f);
                }
            }
            Self::Link(link) => link.label.walk(f),
            Self::Admonition(a) => walk_all(&a.children, f),
            Self::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    walk_all(&cell.children, f);
                }
            }
            Self::Quote(q) => walk_all(&q.children, f),
            Self::OpenBlock(b) => walk_all(&b.children, f),
            Self::ConditionalBlock(c) => walk_all(&c.children, f),
            Self::LineBreak(_)
            | Self::PageBreak(_)
            | Self::Listing(_)
            | Self::Macro(_)
            | Self::Anchor(_)
            | Self::PassthroughBlock(_)
            | Self::Attribute(_) => {}
        }
    }
}

/// Walk a sequence of elements with [`Element::walk`].
pub fn walk_all(elements: &[Element], f: &mut dyn FnMut(&Element)) {
    for element in elements {
        element.walk(f);
    }
}

/// Concatenated text of inline elements, without markup.
///
/// Used for section ids, table of contents entries, and `alt` texts.
pub fn plain_text(elements: &[Element]) -> String {
    let mut out = String::new();
    for element in elements {
        push_plain_text(element, &mut out);
    }
    out
}

fn push_plain_text(element: &Element, out: &mut String) {
    match element {
        Element::Text(text) => match &text.content {
            TextContent::Plain(value) => out.push_str(value),
            TextContent::Nested(children) => {
                for child in children {
                    push_plain_text(child, out);
                }
            }
        },
        Element::Paragraph(p) => {
            for child in &p.children {
                push_plain_text(child, out);
            }
        }
        Element::Code(code) if code.inline => out.push_str(&code.content()),
        Element::Link(link) => push_plain_text(&link.label, out),
        Element::Anchor(anchor) => out.push_str(anchor.label.as_deref().unwrap_or(&anchor.id)),
        Element::Macro(m) if m.inline && m.name != "footnote" => out.push_str(
            m.options
                .positional(1)
                .filter(|label| !label.is_empty())
                .unwrap_or(&m.target),
        ),
        Element::LineBreak(_) => out.push(' '),
        Element::Attribute(Attribute::Reference { name }) => {
            out.push('{');
            out.push_str(name);
            out.push('}');
        }
        _ => {}
    }
}

/// Inline text style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TextStyle {
    Bold,
    Italic,
    Mark,
    Superscript,
    Subscript,
}

/// Content of a [`Text`] run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TextContent {
    Plain(String),
    Nested(Vec<Element>),
}

/// Inline-formatted run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Text {
    pub styles: Vec<TextStyle>,
    pub content: TextContent,
    pub options: Options,
}

impl Text {
    /// Unstyled text.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            styles: Vec::new(),
            content: TextContent::Plain(value.into()),
            options: Options::new(),
        }
    }

    /// Styled run over nested inline elements.
    pub fn styled(styles: Vec<TextStyle>, children: Vec<Element>, options: Options) -> Self {
        Self {
            styles,
            content: TextContent::Nested(children),
            options,
        }
    }

    /// Text without markup.
    pub fn to_plain_string(&self) -> String {
        match &self.content {
            TextContent::Plain(value) => value.clone(),
            TextContent::Nested(children) => plain_text(children),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paragraph {
    pub children: Vec<Element>,
    pub options: Options,
}

/// Section with a heading and nested content.
///
/// `level` is the number of `=` of the heading: `== Title` is level 2.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Section {
    pub level: usize,
    pub title: Vec<Element>,
    pub children: Vec<Element>,
    pub options: Options,
}

/// Options-only marker used by line and page breaks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub options: Options,
}

/// A `<1> text` explanation following a code block.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallOut {
    pub number: usize,
    pub text: Vec<Element>,
}

/// Source code, either a block or an inline `` `code` `` span.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Code {
    pub language: Option<String>,
    pub lines: Vec<String>,
    pub callouts: Vec<CallOut>,
    pub inline: bool,
    pub options: Options,
}

impl Code {
    /// Inline code span.
    pub fn inline(value: impl Into<String>) -> Self {
        Self {
            language: None,
            lines: vec![value.into()],
            callouts: Vec::new(),
            inline: true,
            options: Options::new(),
        }
    }

    /// Content lines joined with newlines.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }
}

/// Literal (`....`) or styled listing block.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Listing {
    pub style: Option<String>,
    pub lines: Vec<String>,
    pub options: Options,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListItem {
    pub children: Vec<Element>,
}

/// Ordered or unordered list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct List {
    pub items: Vec<ListItem>,
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptionItem {
    pub term: Vec<Element>,
    pub description: Vec<Element>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptionList {
    pub items: Vec<DescriptionItem>,
    pub options: Options,
}

/// Hyperlink with a rendered label.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub url: String,
    pub label: Box<Element>,
    pub options: Options,
}

impl Link {
    /// Link labelled with its own URL.
    pub fn new(url: impl Into<String>, options: Options) -> Self {
        let url = url.into();
        let label = Text {
            options: Options::new().with("nowrap", "true"),
            ..Text::plain(url.clone())
        };
        Self {
            url,
            label: Box::new(Element::Text(label)),
            options,
        }
    }

    /// Link with an explicit label element.
    pub fn with_label(url: impl Into<String>, label: Element, options: Options) -> Self {
        Self {
            url: url.into(),
            label: Box::new(label),
            options,
        }
    }
}

/// `name:target[options]` inline macro or `name::target[options]` block macro.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Macro {
    pub name: String,
    pub target: String,
    pub options: Options,
    pub inline: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum AdmonitionKind {
    Note,
    Tip,
    Important,
    Caution,
    Warning,
}

impl AdmonitionKind {
    /// Parse an upper-case label such as `NOTE`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "NOTE" => Some(Self::Note),
            "TIP" => Some(Self::Tip),
            "IMPORTANT" => Some(Self::Important),
            "CAUTION" => Some(Self::Caution),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Note => "NOTE",
            Self::Tip => "TIP",
            Self::Important => "IMPORTANT",
            Self::Caution => "CAUTION",
            Self::Warning => "WARNING",
        }
    }

    /// Lower-case name used as CSS class.
    pub fn class(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Caution => "caution",
            Self::Warning => "warning",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Admonition {
    pub kind: AdmonitionKind,
    pub children: Vec<Element>,
    pub options: Options,
}

/// Reference to an identifier, as written `<<id>>` or `<<id,label>>`.
///
/// Without a label the renderer uses the title of the section declaring `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Anchor {
    pub id: String,
    pub label: Option<String>,
}

/// Cell style of a table column (`a`, `e`, `s`, `m`, `l`, `h`, `d`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CellStyle {
    #[default]
    Default,
    AsciiDoc,
    Emphasis,
    Strong,
    Monospace,
    Literal,
    Header,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSpec {
    /// Relative width weight.
    pub width: u32,
    pub style: CellStyle,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            width: 1,
            style: CellStyle::Default,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableCell {
    pub children: Vec<Element>,
    pub style: CellStyle,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub header: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<TableRow>,
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quote {
    pub attribution: Option<String>,
    pub citetitle: Option<String>,
    pub children: Vec<Element>,
    pub options: Options,
}

/// `--` open block or `====` example block (style `example`).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenBlock {
    pub children: Vec<Element>,
    pub options: Options,
}

/// Raw content emitted without escaping.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassthroughBlock {
    pub content: String,
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionalBlock {
    pub condition: Condition,
    pub children: Vec<Element>,
    pub options: Options,
}

/// Attribute node.
///
/// `Set` and `Unset` come from body attribute entries (`:name: value`,
/// `:name!:`) and change the running attributes for the nodes that follow.
/// `Reference` is an inline `{name}` the parser could not substitute.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum Attribute {
    Set { name: String, value: String },
    Unset { name: String },
    Reference { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn section(level: usize, title: &str, children: Vec<Element>) -> Element {
        Element::Section(Section {
            level,
            title: vec![Element::text(title)],
            children,
            options: Options::new(),
        })
    }

    #[test]
    fn test_link_default_label() {
        let link = Link::new("https://example.com", Options::new());
        let Element::Text(label) = link.label.as_ref() else {
            panic!("expected text label");
        };
        assert_eq!(label.to_plain_string(), "https://example.com");
        assert_eq!(label.options.get("nowrap"), Some("true"));
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let doc = vec![
            section(
                2,
                "First",
                vec![Element::Paragraph(Paragraph {
                    children: vec![Element::text("a")],
                    options: Options::new(),
                })],
            ),
            section(2, "Second", vec![]),
        ];

        let mut kinds = Vec::new();
        walk_all(&doc, &mut |e| kinds.push(e.kind()));

        assert_eq!(
            kinds,
            vec![
                ElementKind::Section,
                ElementKind::Text,
                ElementKind::Paragraph,
                ElementKind::Text,
                ElementKind::Section,
                ElementKind::Text,
            ]
        );
    }

    #[test]
    fn test_walk_enters_inactive_conditionals() {
        let block = Element::ConditionalBlock(ConditionalBlock {
            condition: Condition::Ifdef("never".to_owned()),
            children: vec![section(2, "Hidden", vec![])],
            options: Options::new(),
        });

        let mut sections = 0;
        block.walk(&mut |e| {
            if e.kind() == ElementKind::Section {
                sections += 1;
            }
        });
        assert_eq!(sections, 1);
    }

    #[test]
    fn test_plain_text_flattens_styles() {
        let title = vec![
            Element::text("Hello "),
            Element::Text(Text::styled(
                vec![TextStyle::Bold],
                vec![Element::text("bold")],
                Options::new(),
            )),
            Element::Code(Code::inline(" code")),
        ];
        assert_eq!(plain_text(&title), "Hello bold code");
    }

    #[test]
    fn test_admonition_kind_labels() {
        for kind in [
            AdmonitionKind::Note,
            AdmonitionKind::Tip,
            AdmonitionKind::Important,
            AdmonitionKind::Caution,
            AdmonitionKind::Warning,
        ] {
            assert_eq!(AdmonitionKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(AdmonitionKind::from_label("note"), None);
    }
}
