//! Public parser entry point.

use std::collections::BTreeMap;

use adoc_model::{Document, Element};

use crate::block::BlockParser;
use crate::error::ParseError;
use crate::include::IncludeExpander;
use crate::inline::parse_inline;
use crate::reader::Reader;
use crate::resolver::ParserContext;
use crate::substitution::substitute;

/// Default limit for nested includes.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// AsciiDoc parser.
///
/// A parser holds configuration only. Every [`parse`](Self::parse) call gets
/// its own cursor, so one instance can be shared across threads.
#[derive(Clone, Debug)]
pub struct Parser {
    attributes: BTreeMap<String, String>,
    max_include_depth: usize,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Attributes available to `{name}` references and include targets.
    ///
    /// Attribute entries in the document do not override these.
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Parse `source` into a document.
    ///
    /// Includes are resolved through the context's resolver before block
    /// parsing starts.
    pub fn parse(&self, source: &str, context: &ParserContext<'_>) -> Result<Document, ParseError> {
        let lines = IncludeExpander::new(
            context.resolver(),
            self.max_include_depth,
            self.attributes.clone(),
        )
        .expand_source(source)?;

        let mut reader = Reader::new(lines);
        let mut blocks = BlockParser::new(self.attributes.clone());
        let header = blocks.parse_header(&mut reader)?;
        let body = blocks.parse_blocks(&mut reader, None)?;
        tracing::debug!(elements = body.len(), "Parsed document");
        Ok(Document { header, body })
    }

    /// Parse inline markup only. Never fails: unmatched markup stays literal.
    pub fn parse_inline(&self, text: &str) -> Vec<Element> {
        parse_inline(&substitute(text, &self.attributes))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
