//! Document tree for AsciiDoc-like markup.
//!
//! The parser produces a [`Document`] once; renderers only read it.
//!
//! # Architecture
//!
//! - [`Element`]: closed set of block and inline nodes
//! - [`Options`]: immutable string map carried by most nodes
//! - [`Condition`]: unevaluated predicate of a conditional block, tested
//!   against an [`AttributeLookup`] at render time
//!
//! With the `serde` feature the tree can be serialized, for example to cache
//! parse results. Blocks using [`Condition::Custom`] fail to serialize.
//!
//! # Example
//!
//! ```
//! use adoc_model::{Document, Element, Header, Paragraph, Options};
//!
//! let document = Document {
//!     header: Header {
//!         title: "Guide".to_owned(),
//!         ..Header::default()
//!     },
//!     body: vec![Element::Paragraph(Paragraph {
//!         children: vec![Element::text("Hello")],
//!         options: Options::new(),
//!     })],
//! };
//! assert_eq!(document.body.len(), 1);
//! ```

mod condition;
mod document;
mod element;
mod options;

pub use condition::{AttributeLookup, Condition, Expression, Operand, Operator, Predicate};
pub use document::{Author, Document, Header, Revision};
pub use element::{
    Admonition, AdmonitionKind, Anchor, Attribute, CallOut, CellStyle, Code, ColumnSpec,
    ConditionalBlock, DescriptionItem, DescriptionList, Element, ElementKind, Link, List,
    ListItem, Listing, Macro, Marker, OpenBlock, Paragraph, PassthroughBlock, Quote, Section,
    Table, TableCell, TableRow, Text, TextContent, TextStyle, plain_text, walk_all,
};
pub use options::Options;
