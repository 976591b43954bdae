//! First rendering pass: anchor collection.
//!
//! A `<<id>>` may point at a section declared further down, so every section
//! id and explicit anchor is collected before any markup is emitted. Sections
//! and anchors inside conditional blocks are collected whether or not the
//! condition holds; sections remember whether they will be shown so the
//! table of contents can skip hidden ones.

use std::collections::{BTreeMap, HashMap};

use adoc_model::{Document, Element, Section, TextContent, plain_text, walk_all};

use crate::attributes::RunningAttributes;
use crate::ids::IdGenerator;

/// A section found by [`collect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectedSection {
    pub id: String,
    pub level: usize,
    /// Title without markup.
    pub title: String,
    /// Whether every enclosing conditional holds.
    pub active: bool,
}

/// Target of a resolved reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedAnchor<'a> {
    pub id: &'a str,
    pub label: &'a str,
}

/// Identifiers declared in a document.
#[derive(Clone, Debug, Default)]
pub struct AnchorIndex {
    /// Declared id to its label, if it has one.
    labels: HashMap<String, Option<String>>,
    /// Section title to section id, first declaration wins.
    titles: HashMap<String, String>,
    sections: Vec<CollectedSection>,
}

impl AnchorIndex {
    /// Look up `reference` as a declared id, then as a section title.
    pub fn resolve(&self, reference: &str) -> Option<ResolvedAnchor<'_>> {
        if let Some((id, label)) = self.labels.get_key_value(reference) {
            let id = id.as_str();
            return Some(ResolvedAnchor {
                id,
                label: label.as_deref().unwrap_or(id),
            });
        }
        let (title, id) = self.titles.get_key_value(reference)?;
        let id = id.as_str();
        let label = self
            .labels
            .get(id)
            .and_then(Option::as_deref)
            .unwrap_or(title.as_str());
        Some(ResolvedAnchor { id, label })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.labels.contains_key(id)
    }

    /// Sections in document order, including those in inactive branches.
    pub fn sections(&self) -> &[CollectedSection] {
        &self.sections
    }

    fn declare(&mut self, id: &str, label: Option<&str>) {
        if self.labels.contains_key(id) {
            tracing::debug!(id, "Duplicate anchor id, keeping first declaration");
            return;
        }
        self.labels
            .insert(id.to_owned(), label.map(str::to_owned));
    }
}

/// Collect section ids and explicit anchors of `document`.
///
/// `overrides` are the configuration attributes; they decide, together with
/// header and body attribute entries, which conditional branches are active.
pub fn collect(document: &Document, overrides: &BTreeMap<String, String>) -> AnchorIndex {
    let attributes = RunningAttributes::new(&document.header, overrides);
    let mut ids = IdGenerator::new(&attributes);
    walk_all(&document.body, &mut |element| {
        if let Element::Section(section) = element
            && let Some(id) = section.options.id()
        {
            ids.reserve(id);
        }
    });

    let mut collector = Collector {
        index: AnchorIndex::default(),
        ids,
        attributes,
    };
    collector.visit_all(&document.body, true);
    tracing::debug!(
        anchors = collector.index.labels.len(),
        sections = collector.index.sections.len(),
        "Collected anchors"
    );
    collector.index
}

struct Collector {
    index: AnchorIndex,
    ids: IdGenerator,
    attributes: RunningAttributes,
}

impl Collector {
    fn visit_all(&mut self, elements: &[Element], active: bool) {
        for element in elements {
            self.visit(element, active);
        }
    }

    fn visit(&mut self, element: &Element, active: bool) {
        if !matches!(element, Element::Section(_))
            && let Some(options) = element.options()
            && let Some(id) = options.id()
        {
            let label = options.get("reftext").or_else(|| options.title());
            self.index.declare(id, label);
        }

        match element {
            Element::Section(section) => self.section(section, active),
            Element::ConditionalBlock(block) => {
                let holds = active && block.condition.test(&self.attributes);
                self.visit_all(&block.children, holds);
            }
            Element::Attribute(attribute) => {
                if active {
                    self.attributes.apply(attribute);
                }
            }
            Element::Macro(m) => {
                if m.name == "anchor" && !m.target.is_empty() {
                    self.index.declare(&m.target, m.options.get("reftext"));
                }
            }
            Element::Text(text) => {
                if let TextContent::Nested(children) = &text.content {
                    self.visit_all(children, active);
                }
            }
            Element::Paragraph(p) => self.visit_all(&p.children, active),
            Element::Code(code) => {
                for callout in &code.callouts {
                    self.visit_all(&callout.text, active);
                }
            }
            Element::UnOrderedList(list) | Element::OrderedList(list) => {
                for item in &list.items {
                    self.visit_all(&item.children, active);
                }
            }
            Element::DescriptionList(list) => {
                for item in &list.items {
                    self.visit_all(&item.term, active);
                    self.visit_all(&item.description, active);
                }
            }
            Element::Link(link) => self.visit(&link.label, active),
            Element::Admonition(a) => self.visit_all(&a.children, active),
            Element::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    self.visit_all(&cell.children, active);
                }
            }
            Element::Quote(q) => self.visit_all(&q.children, active),
            Element::OpenBlock(b) => self.visit_all(&b.children, active),
            Element::LineBreak(_)
            | Element::PageBreak(_)
            | Element::Listing(_)
            | Element::Anchor(_)
            | Element::PassthroughBlock(_) => {}
        }
    }

    fn section(&mut self, section: &Section, active: bool) {
        let title = plain_text(&section.title);
        let id = match section.options.id() {
            Some(id) => id.to_owned(),
            None => self.ids.generate(&title),
        };
        self.index.declare(&id, Some(title.as_str()));
        self.index
            .titles
            .entry(title.clone())
            .or_insert_with(|| id.clone());
        self.index.sections.push(CollectedSection {
            id,
            level: section.level,
            title,
            active,
        });

        self.visit_all(&section.title, active);
        self.visit_all(&section.children, active);
    }
}

/// Number of sections nested anywhere in `elements`.
pub(crate) fn count_sections(elements: &[Element]) -> usize {
    let mut count = 0;
    walk_all(elements, &mut |element| {
        if matches!(element, Element::Section(_)) {
            count += 1;
        }
    });
    count
}
