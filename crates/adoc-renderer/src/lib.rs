//! HTML renderer for parsed AsciiDoc documents.
//!
//! Takes the [`Document`](adoc_model::Document) produced by `adoc-parser` and
//! emits Asciidoctor-compatible HTML.
//!
//! # Architecture
//!
//! Rendering is two-pass:
//!
//! 1. [`anchors::collect`] walks the whole tree, assigning section ids and
//!    indexing explicit anchors so forward references resolve.
//! 2. [`HtmlRenderer`] walks the tree again and writes markup, tracking
//!    attribute entries and conditional blocks as it goes.
//!
//! Problems that do not stop rendering, such as unresolved cross references
//! or unreadable images, are logged with `tracing` and returned in
//! [`RenderResult::warnings`].
//!
//! # Example
//!
//! ```
//! use adoc_model::{Document, Element, Header, Options, Paragraph};
//! use adoc_renderer::{Configuration, HtmlRenderer};
//!
//! let document = Document {
//!     header: Header::default(),
//!     body: vec![Element::Paragraph(Paragraph {
//!         children: vec![Element::text("Hello")],
//!         options: Options::new(),
//!     })],
//! };
//!
//! let config = Configuration::default().with_attribute("noheader", "");
//! let result = HtmlRenderer::new(config).render(&document);
//! assert_eq!(result.html, " <div class=\"paragraph\">\n <p>Hello</p>\n </div>\n");
//! ```

pub mod anchors;
mod attributes;
mod config;
mod data_uri;
mod escape;
mod html;
mod ids;
mod toc;

pub use config::{Configuration, ConfigurationError, DEFAULT_SECTION_TAG};
pub use escape::escape_html;
pub use html::{HtmlRenderer, RenderResult};
pub use toc::TocEntry;
