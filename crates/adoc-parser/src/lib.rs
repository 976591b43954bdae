//! Parser for AsciiDoc-like markup.
//!
//! Turns source text into an [`adoc_model::Document`]. Rendering is left to
//! other crates.
//!
//! # Architecture
//!
//! Parsing runs in three stages:
//! - Include expansion: `include::` directives are resolved through a
//!   [`ContentResolver`] and spliced into one stream of lines, each keeping
//!   its file and line number for error reporting
//! - Block parsing: a line cursor recognizes the header, sections, delimited
//!   blocks, lists, tables and conditionals
//! - Inline parsing: paragraph text, titles and cells are scanned for quoted
//!   text, macros, links and cross-references
//!
//! Attribute references are substituted at parse time. Conditionals are kept
//! in the tree unevaluated; the renderer decides which branch is shown.
//!
//! # Example
//!
//! ```
//! use adoc_parser::{Parser, ParserContext};
//! use adoc_model::Element;
//!
//! let document = Parser::new()
//!     .with_attribute("product", "Widget")
//!     .parse("= {product} Guide\n\nSee *bold* text.", &ParserContext::default())
//!     .unwrap();
//!
//! assert_eq!(document.header.title, "Widget Guide");
//! assert!(matches!(document.body[0], Element::Paragraph(_)));
//! ```

mod attributes;
mod block;
mod error;
mod expression;
mod include;
mod inline;
mod parser;
mod reader;
mod resolver;
mod substitution;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{DEFAULT_MAX_INCLUDE_DEPTH, Parser};
pub use resolver::{
    ContentResolver, FsContentResolver, NoopContentResolver, ParserContext, Resolved,
};

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Parser: Send, Sync, Clone);
    static_assertions::assert_impl_all!(ParseError: Send, Sync, std::error::Error);
    static_assertions::assert_impl_all!(FsContentResolver: Send, Sync);
}
