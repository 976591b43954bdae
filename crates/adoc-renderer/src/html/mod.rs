//! Second rendering pass: HTML emission.

mod block;
mod inline;

use std::fmt::Write;
use std::path::{Path, PathBuf};

use adoc_model::{Document, Element, Header, Options};

use crate::anchors::{self, AnchorIndex};
use crate::attributes::RunningAttributes;
use crate::config::{Configuration, ConfigurationError};
use crate::data_uri::DataUriResolver;
use crate::escape::push_escaped;
use crate::toc::{DEFAULT_TOC_LEVELS, TocEntry, toc_entries, write_toc};

/// MathJax delimiter setup followed by the loader.
///
/// Inline LaTeX uses `\(..\)`, display LaTeX `\[..\]`, AsciiMath `\$..\$`.
/// AsciiMath inside a `stemblock` is displayed as a block.
const MATHJAX_SCRIPT: &str = r#"<script type="text/x-mathjax-config">
MathJax.Hub.Config({
  messageStyle: "none",
  tex2jax: { inlineMath: [["\\(", "\\)"]], displayMath: [["\\[", "\\]"]], ignoreClass: "nostem|nolatexmath" },
  asciimath2jax: { delimiters: [["\\$", "\\$"]], ignoreClass: "nostem|noasciimath" },
  TeX: { equationNumbers: { autoNumber: "none" } }
})
MathJax.Hub.Register.StartupHook("AsciiMath Jax Ready", function () {
  MathJax.InputJax.AsciiMath.postfilterHooks.Add(function (data, node) {
    if ((node = data.script.parentNode) && (node = node.parentNode) && node.classList.contains("stemblock")) {
      data.math.root.display = "block"
    }
    return data
  })
})
</script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.9/MathJax.js?config=TeX-MML-AM_HTMLorMML"></script>
"#;

const ASCIIDOCTOR_CSS: &str = "<link rel=\"stylesheet\" href=\"https://cdnjs.cloudflare.com/ajax/libs/asciidoctor.js/1.5.9/css/asciidoctor.min.css\" integrity=\"sha512-lb4ZuGfCVoGO2zu/TMakNlBgRA6mPXZ0RamTYgluFxULAwOoNnBIZaNjsdfhnlKlIbENaQbEAYEWxtzjkB8wsQ==\" crossorigin=\"anonymous\" referrerpolicy=\"no-referrer\" />\n";

/// Result of rendering a document.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Document title from the header, if any.
    pub title: Option<String>,
    /// Table of contents entries, whether or not the document shows a TOC.
    pub toc: Vec<TocEntry>,
    /// Recoverable problems, e.g. unresolved cross references.
    pub warnings: Vec<String>,
}

/// A footnote collected while rendering.
#[derive(Debug)]
struct Footnote {
    id: Option<String>,
    text: String,
}

/// HTML renderer for one document.
///
/// Rendering runs in two passes: [`anchors::collect`] indexes every section
/// and anchor, then the tree is walked again to emit markup, resolving
/// `<<id>>` references against that index.
///
/// # Example
///
/// ```
/// use adoc_model::{Document, Header};
/// use adoc_renderer::{Configuration, HtmlRenderer};
///
/// let document = Document {
///     header: Header {
///         title: "Test".to_owned(),
///         ..Header::default()
///     },
///     body: Vec::new(),
/// };
///
/// let result = HtmlRenderer::new(Configuration::default()).render(&document);
/// assert!(result.html.contains("<h1>Test</h1>"));
/// assert_eq!(result.title.as_deref(), Some("Test"));
/// ```
#[derive(Debug)]
pub struct HtmlRenderer {
    config: Configuration,
    output: String,
    attributes: RunningAttributes,
    anchors: AnchorIndex,
    /// Index into `anchors.sections()` of the next section to emit.
    next_section: usize,
    footnotes: Vec<Footnote>,
    warnings: Vec<String>,
    toc: Vec<TocEntry>,
    title: Option<String>,
    has_stem: bool,
    data_uri: Option<DataUriResolver>,
}

impl HtmlRenderer {
    /// Create a renderer without validating `config`.
    pub fn new(config: Configuration) -> Self {
        let attributes = RunningAttributes::new(&Header::default(), &config.attributes);
        Self {
            config,
            output: String::with_capacity(4096),
            attributes,
            anchors: AnchorIndex::default(),
            next_section: 0,
            footnotes: Vec::new(),
            warnings: Vec::new(),
            toc: Vec::new(),
            title: None,
            has_stem: false,
            data_uri: None,
        }
    }

    /// Create a renderer, rejecting an invalid configuration.
    pub fn try_new(config: Configuration) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Render `document` into the output buffer.
    pub fn visit(&mut self, document: &Document) {
        self.attributes = RunningAttributes::new(&document.header, &self.config.attributes);
        self.anchors = anchors::collect(document, &self.config.attributes);
        self.next_section = 0;

        let levels = self
            .attributes
            .get("toclevels")
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(DEFAULT_TOC_LEVELS);
        self.toc = toc_entries(self.anchors.sections(), levels);
        self.title = Some(document.header.title.clone()).filter(|t| !t.is_empty());
        self.data_uri = self
            .attributes
            .contains("data-uri")
            .then(|| DataUriResolver::new(self.image_base()));

        let content_only = self.attributes.contains("noheader");
        if !content_only {
            self.open_document();
            if !self.config.skip_global_content_wrapper {
                self.output.push_str(" <div id=\"content\">\n");
            }
            self.header(&document.header);
        }

        if self
            .attributes
            .get("toc")
            .is_some_and(|placement| placement != "macro")
        {
            self.table_of_contents();
        }
        self.body(&document.body);
        self.write_footnotes();

        if !content_only {
            if !self.config.skip_global_content_wrapper {
                self.output.push_str(" </div>\n");
            }
            self.close_document();
        }
        tracing::debug!(
            bytes = self.output.len(),
            warnings = self.warnings.len(),
            "Rendered document"
        );
    }

    /// Consume the renderer and return the accumulated output.
    pub fn result(self) -> RenderResult {
        RenderResult {
            html: self.output,
            title: self.title,
            toc: self.toc,
            warnings: self.warnings,
        }
    }

    /// Visit `document` and return the result.
    pub fn render(mut self, document: &Document) -> RenderResult {
        self.visit(document);
        self.result()
    }

    fn open_document(&mut self) {
        self.output.push_str("<!DOCTYPE html>\n<html");
        if !self.attributes.contains("nolang") {
            self.output.push_str(" lang=\"");
            push_escaped(&mut self.output, self.attributes.get("lang").unwrap_or("en"));
            self.output.push('"');
        }
        self.output.push_str(">\n<head>\n <meta charset=\"");
        push_escaped(
            &mut self.output,
            self.attributes.get("encoding").unwrap_or("UTF-8"),
        );
        self.output
            .push_str("\">\n <meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">\n");
        let meta = [
            ("application-name", "app-name"),
            ("description", "description"),
            ("keywords", "keywords"),
            ("author", "author"),
            ("copyright", "copyright"),
        ];
        for (name, attribute) in meta {
            if let Some(value) = self.attributes.get(attribute) {
                write!(self.output, " <meta name=\"{name}\" content=\"").unwrap();
                push_escaped(&mut self.output, value);
                self.output.push_str("\">\n");
            }
        }
        if self.attributes.contains("asciidoctor-css") {
            self.output.push(' ');
            self.output.push_str(ASCIIDOCTOR_CSS);
        }
        // Raw HTML hooks, written unescaped.
        if let Some(css) = self.attributes.get("custom-css") {
            self.output.push_str(css);
        }
        self.output.push_str("</head>\n<body");
        if let Some(classes) = self.attributes.get("body-classes") {
            self.output.push_str(" class=\"");
            push_escaped(&mut self.output, classes);
            self.output.push('"');
        }
        self.output.push_str(">\n");
        if let Some(html) = self.attributes.get("header-html") {
            self.output.push_str(html);
        }
    }

    fn close_document(&mut self) {
        if self.has_stem && !self.attributes.contains("skip-stem-js") {
            self.output.push_str(MATHJAX_SCRIPT);
        }
        if let Some(scripts) = self.attributes.get("custom-js") {
            for script in scripts.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                writeln!(self.output, " {script}").unwrap();
            }
        }
        self.output.push_str("</body>\n</html>\n");
    }

    fn header(&mut self, header: &Header) {
        if !header.title.is_empty() && !self.attributes.contains("notitle") {
            self.output.push_str(" <h1>");
            push_escaped(&mut self.output, &header.title);
            self.output.push_str("</h1>\n");
        }

        let mut details = String::new();
        for (index, author) in header.authors.iter().enumerate() {
            let n = index + 1;
            write!(details, "  <span class=\"author author-{n}\">").unwrap();
            push_escaped(&mut details, &author.name);
            details.push_str("</span>\n");
            if let Some(email) = &author.email {
                write!(details, "  <span class=\"email email-{n}\">").unwrap();
                push_escaped(&mut details, email);
                details.push_str("</span>\n");
            }
        }
        if let Some(revision) = &header.revision {
            let fields = [
                ("revnumber", Some(revision.number.as_str())),
                ("revdate", revision.date.as_deref()),
                ("revremark", revision.remark.as_deref()),
            ];
            for (id, value) in fields {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    write!(details, "  <span id=\"{id}\">").unwrap();
                    push_escaped(&mut details, value);
                    details.push_str("</span>\n");
                }
            }
        }
        if !details.is_empty() {
            self.output.push_str(" <div class=\"details\">\n");
            self.output.push_str(&details);
            self.output.push_str(" </div>\n");
        }
    }

    fn table_of_contents(&mut self) {
        let title = self.attributes.get("toc-title").unwrap_or("Table of Contents");
        let class = self.attributes.get("toc-class").unwrap_or("toc");
        write_toc(&mut self.output, &self.toc, title, class);
    }

    /// Top-level blocks, wrapping content before the first section in a preamble.
    fn body(&mut self, body: &[Element]) {
        let first_section = body
            .iter()
            .position(|e| matches!(e, Element::Section(_)));
        let preamble = match first_section {
            Some(index) => &body[..index],
            None => &[],
        };
        if preamble
            .iter()
            .any(|e| !matches!(e, Element::Attribute(_)))
        {
            self.output
                .push_str(" <div id=\"preamble\">\n <div class=\"sectionbody\">\n");
            self.elements(preamble);
            self.output.push_str(" </div>\n </div>\n");
            self.elements(&body[preamble.len()..]);
        } else {
            self.elements(body);
        }
    }

    fn elements(&mut self, elements: &[Element]) {
        for element in elements {
            self.element(element);
        }
    }

    fn element(&mut self, element: &Element) {
        match element {
            Element::Text(text) => self.text(text),
            Element::Paragraph(p) => self.paragraph(p),
            Element::Section(section) => self.section(section),
            Element::LineBreak(_) => self.output.push_str("<br>\n"),
            Element::PageBreak(_) => self.output.push_str(" <div class=\"page-break\"></div>\n"),
            Element::Code(code) if code.inline => self.inline_code(code),
            Element::Code(code) => self.code_block(code),
            Element::Listing(listing) => self.listing(listing),
            Element::UnOrderedList(list) => self.unordered_list(list),
            Element::OrderedList(list) => self.ordered_list(list),
            Element::DescriptionList(list) => self.description_list(list),
            Element::Link(link) => self.link(link),
            Element::Macro(m) => self.macro_element(m),
            Element::Admonition(admonition) => self.admonition(admonition),
            Element::Anchor(anchor) => self.anchor(&anchor.id, anchor.label.as_deref()),
            Element::Table(table) => self.table(table),
            Element::Quote(quote) => self.quote(quote),
            Element::OpenBlock(block) => self.open_block(block),
            Element::PassthroughBlock(block) => self.passthrough_block(block),
            Element::ConditionalBlock(block) => self.conditional(block),
            Element::Attribute(attribute) => self.attribute(attribute),
        }
    }

    /// Write ` class`, ` id` and `data-*` attributes for `options`.
    ///
    /// `class` is the element's own class; the `role` option is appended.
    fn write_attributes(&mut self, options: &Options, class: &str) {
        self.write_attributes_with_id(options, class, options.id());
    }

    fn write_attributes_with_id(&mut self, options: &Options, class: &str, id: Option<&str>) {
        let role = options.role().map(|r| r.replace('.', " "));
        let classes = match (class.is_empty(), role) {
            (_, None) => class.to_owned(),
            (true, Some(role)) => role,
            (false, Some(role)) => format!("{class} {role}"),
        };
        if !classes.is_empty() {
            self.output.push_str(" class=\"");
            push_escaped(&mut self.output, classes.trim());
            self.output.push('"');
        }
        if let Some(id) = id {
            self.output.push_str(" id=\"");
            push_escaped(&mut self.output, id);
            self.output.push('"');
        }
        if self.config.support_data_attributes {
            for (key, value) in options.iter().filter(|(k, _)| k.starts_with("data-")) {
                write!(self.output, " {key}=\"").unwrap();
                push_escaped(&mut self.output, value);
                self.output.push('"');
            }
        }
    }

    /// ` <div class="title">` for a `.Title` line.
    fn block_title(&mut self, options: &Options) {
        if let Some(title) = options.title() {
            self.output.push_str("  <div class=\"title\">");
            push_escaped(&mut self.output, title);
            self.output.push_str("</div>\n");
        }
    }

    /// Directory relative image targets are read from for `data-uri`.
    fn image_base(&self) -> PathBuf {
        self.config
            .assets_base()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}
