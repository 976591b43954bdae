//! Inline nodes and macros.

use std::fmt::Write;

use adoc_model::{Attribute, Code, Element, Link, Macro, Text, TextContent, TextStyle};

use super::{Footnote, HtmlRenderer};
use crate::data_uri::is_remote;
use crate::escape::push_escaped;

/// Separator between menu levels.
const CARET: &str = "&#160;<b class=\"caret\">&#8250;</b> ";

impl HtmlRenderer {
    pub(super) fn text(&mut self, text: &Text) {
        let mut tags: Vec<&str> = text
            .styles
            .iter()
            .map(|style| match style {
                TextStyle::Bold => "strong",
                TextStyle::Italic => "em",
                TextStyle::Mark => "mark",
                TextStyle::Superscript => "sup",
                TextStyle::Subscript => "sub",
            })
            .collect();
        let decorated = text.options.role().is_some() || text.options.id().is_some();
        if tags.is_empty() && decorated {
            tags.push("span");
        }

        for (index, tag) in tags.iter().enumerate() {
            write!(self.output, "<{tag}").unwrap();
            if index == 0 && decorated {
                self.write_attributes(&text.options, "");
            }
            self.output.push('>');
        }
        match &text.content {
            TextContent::Plain(value) => push_escaped(&mut self.output, value),
            TextContent::Nested(children) => self.elements(children),
        }
        for tag in tags.iter().rev() {
            write!(self.output, "</{tag}>").unwrap();
        }
    }

    pub(super) fn inline_code(&mut self, code: &Code) {
        self.output.push_str("<code");
        self.write_attributes(&code.options, "");
        self.output.push('>');
        push_escaped(&mut self.output, &code.content());
        self.output.push_str("</code>");
    }

    pub(super) fn link(&mut self, link: &Link) {
        let bare = matches!(&*link.label, Element::Text(t) if t.options.contains_key("nowrap"));
        self.output.push_str("<a href=\"");
        push_escaped(&mut self.output, &link.url);
        self.output.push('"');
        self.write_attributes(&link.options, if bare { "bare" } else { "" });
        let window = link.options.get("window");
        if let Some(window) = window {
            self.output.push_str(" target=\"");
            push_escaped(&mut self.output, window);
            self.output.push('"');
        }
        let noopener = window == Some("_blank") || link.options.has_option("noopener");
        match (link.options.has_option("nofollow"), noopener) {
            (true, true) => self.output.push_str(" rel=\"nofollow noopener\""),
            (true, false) => self.output.push_str(" rel=\"nofollow\""),
            (false, true) => self.output.push_str(" rel=\"noopener\""),
            (false, false) => {}
        }
        self.output.push('>');

        let hide_scheme = link.options.contains_key("hide-uri-scheme")
            || self.attributes.contains("hide-uri-scheme");
        match &*link.label {
            Element::Text(Text {
                styles,
                content: TextContent::Plain(value),
                ..
            }) if hide_scheme && styles.is_empty() && value.contains("://") => {
                let shown = value.split_once("://").map_or(value.as_str(), |(_, rest)| rest);
                push_escaped(&mut self.output, shown);
            }
            label => self.element(label),
        }
        self.output.push_str("</a>");
    }

    /// `<<id>>` reference, resolved against the collected anchors.
    pub(super) fn anchor(&mut self, id: &str, label: Option<&str>) {
        if let Some(resolved) = self.anchors.resolve(id) {
            self.output.push_str("<a href=\"#");
            push_escaped(&mut self.output, resolved.id);
            self.output.push_str("\">");
            push_escaped(&mut self.output, label.unwrap_or(resolved.label));
            self.output.push_str("</a>");
            return;
        }

        tracing::warn!(id, "Unresolved cross reference");
        self.output.push_str("<a href=\"#");
        push_escaped(&mut self.output, id);
        self.output.push_str("\" class=\"unresolved\">[");
        push_escaped(&mut self.output, id);
        self.output.push_str("]</a>");
        self.warn(format!("Unresolved cross reference: {id}"));
    }

    pub(super) fn attribute(&mut self, attribute: &Attribute) {
        match attribute {
            Attribute::Set { .. } | Attribute::Unset { .. } => self.attributes.apply(attribute),
            Attribute::Reference { name } => match self.attributes.get(name) {
                Some(value) => push_escaped(&mut self.output, value),
                None => {
                    self.output.push('{');
                    push_escaped(&mut self.output, name);
                    self.output.push('}');
                }
            },
        }
    }

    pub(super) fn macro_element(&mut self, m: &Macro) {
        match m.name.as_str() {
            "image" => self.image(m),
            "icon" => self.icon(m),
            "audio" | "video" => self.media(m),
            "kbd" => self.keyboard(&m.target),
            "btn" => {
                self.output.push_str("<b class=\"button\">");
                push_escaped(&mut self.output, &m.target);
                self.output.push_str("</b>");
            }
            "menu" => self.menu(m),
            "footnote" => self.footnote(m),
            "xref" => self.xref(m),
            "stem" => self.inline_stem(m),
            "pass" => self.output.push_str(&m.target),
            "anchor" => {
                self.output.push_str("<a id=\"");
                push_escaped(&mut self.output, &m.target);
                self.output.push_str("\"></a>");
            }
            "thematic-break" => self.output.push_str(" <hr>\n"),
            "toc" => {
                if self.attributes.get("toc") == Some("macro") {
                    self.table_of_contents();
                }
            }
            name => {
                tracing::warn!(name, target = %m.target, "Unknown macro, rendering as text");
                push_escaped(&mut self.output, name);
                self.output.push(':');
                if !m.inline {
                    self.output.push(':');
                }
                push_escaped(&mut self.output, &m.target);
                self.output.push_str("[]");
            }
        }
    }

    fn image(&mut self, m: &Macro) {
        let alt = m
            .options
            .positional(1)
            .or_else(|| m.options.get("alt"))
            .filter(|alt| !alt.is_empty())
            .map_or_else(|| default_alt(&m.target), str::to_owned);
        let width = m.options.get("width").or_else(|| m.options.positional(2));
        let height = m.options.get("height").or_else(|| m.options.positional(3));
        let src = self.image_src(&m.target);

        let mut img = String::from("<img src=\"");
        push_escaped(&mut img, &src);
        img.push_str("\" alt=\"");
        push_escaped(&mut img, &alt);
        img.push('"');
        for (name, value) in [("width", width), ("height", height)] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                write!(img, " {name}=\"").unwrap();
                push_escaped(&mut img, value);
                img.push('"');
            }
        }
        if m.inline
            && let Some(title) = m.options.title()
        {
            img.push_str(" title=\"");
            push_escaped(&mut img, title);
            img.push('"');
        }
        img.push('>');
        if let Some(link) = m.options.get("link") {
            let mut linked = String::from("<a class=\"image\" href=\"");
            push_escaped(&mut linked, link);
            linked.push_str("\">");
            linked.push_str(&img);
            linked.push_str("</a>");
            img = linked;
        }

        if m.inline {
            self.output.push_str("<span");
            self.write_attributes(&m.options, "image");
            self.output.push('>');
            self.output.push_str(&img);
            self.output.push_str("</span>");
        } else {
            self.output.push_str(" <div");
            self.write_attributes(&m.options, "imageblock");
            self.output.push_str(">\n <div class=\"content\">\n");
            self.output.push_str(&img);
            self.output.push_str("\n </div>\n");
            self.block_title(&m.options);
            self.output.push_str(" </div>\n");
        }
    }

    /// Image source, prefixed with `imagesdir` and inlined when `data-uri` is set.
    fn image_src(&mut self, target: &str) -> String {
        let path = match self.attributes.get("imagesdir").filter(|d| !d.is_empty()) {
            Some(dir) if !is_remote(target) && !target.starts_with('/') => {
                format!("{}/{target}", dir.trim_end_matches('/'))
            }
            _ => target.to_owned(),
        };
        if is_remote(&path) {
            return path;
        }
        let Some(resolver) = self.data_uri.as_mut() else {
            return path;
        };
        match resolver.resolve(&path) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to inline image");
                self.warn(format!("Cannot read image {path}: {e}"));
                path
            }
        }
    }

    fn icon(&mut self, m: &Macro) {
        let size = m.options.get("size").or_else(|| m.options.positional(1));
        let mut class = if m.target.contains(' ') {
            m.target.clone()
        } else if m.target.starts_with("fa-") {
            format!("fa {}", m.target)
        } else {
            format!("fa fa-{}", m.target)
        };
        if let Some(size) = size.filter(|s| !s.is_empty()) {
            write!(class, " fa-{size}").unwrap();
        }
        self.output.push_str("<span");
        self.write_attributes(&m.options, "icon");
        self.output.push_str("><i class=\"");
        push_escaped(&mut self.output, &class);
        self.output.push('"');
        if let Some(title) = m.options.title() {
            self.output.push_str(" title=\"");
            push_escaped(&mut self.output, title);
            self.output.push('"');
        }
        self.output.push_str("></i></span>");
    }

    fn media(&mut self, m: &Macro) {
        let tag = m.name.as_str();
        let src = self.image_src_plain(&m.target);
        self.output.push_str(" <div");
        self.write_attributes(&m.options, &format!("{tag}block"));
        self.output.push_str(">\n");
        self.block_title(&m.options);
        write!(self.output, " <div class=\"content\">\n <{tag} src=\"").unwrap();
        push_escaped(&mut self.output, &src);
        self.output.push('"');
        for name in ["width", "height", "poster"] {
            if let Some(value) = m.options.get(name) {
                write!(self.output, " {name}=\"").unwrap();
                push_escaped(&mut self.output, value);
                self.output.push('"');
            }
        }
        if m.options.has_option("autoplay") {
            self.output.push_str(" autoplay");
        }
        if m.options.has_option("loop") {
            self.output.push_str(" loop");
        }
        if !m.options.has_option("nocontrols") {
            self.output.push_str(" controls");
        }
        writeln!(
            self.output,
            ">\nYour browser does not support the {tag} tag.\n</{tag}>"
        )
        .unwrap();
        self.output.push_str(" </div>\n </div>\n");
    }

    /// Media targets are never inlined, only resolved against `imagesdir`.
    fn image_src_plain(&self, target: &str) -> String {
        match self.attributes.get("imagesdir").filter(|d| !d.is_empty()) {
            Some(dir) if !is_remote(target) && !target.starts_with('/') => {
                format!("{}/{target}", dir.trim_end_matches('/'))
            }
            _ => target.to_owned(),
        }
    }

    fn keyboard(&mut self, keys: &str) {
        let keys: Vec<&str> = if keys.len() > 1 && keys.contains('+') {
            keys.split('+').map(str::trim).filter(|k| !k.is_empty()).collect()
        } else {
            vec![keys.trim()]
        };
        if let [key] = keys.as_slice() {
            self.output.push_str("<kbd>");
            push_escaped(&mut self.output, key);
            self.output.push_str("</kbd>");
            return;
        }
        self.output.push_str("<span class=\"keyseq\">");
        for (index, key) in keys.iter().enumerate() {
            if index > 0 {
                self.output.push('+');
            }
            self.output.push_str("<kbd>");
            push_escaped(&mut self.output, key);
            self.output.push_str("</kbd>");
        }
        self.output.push_str("</span>");
    }

    fn menu(&mut self, m: &Macro) {
        let items: Vec<&str> = m
            .options
            .positional(1)
            .map(|path| {
                path.split('>')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let Some((last, submenus)) = items.split_last() else {
            self.output.push_str("<b class=\"menuref\">");
            push_escaped(&mut self.output, &m.target);
            self.output.push_str("</b>");
            return;
        };

        self.output.push_str("<span class=\"menuseq\"><b class=\"menu\">");
        push_escaped(&mut self.output, &m.target);
        self.output.push_str("</b>");
        self.output.push_str(CARET);
        for submenu in submenus {
            self.output.push_str("<b class=\"submenu\">");
            push_escaped(&mut self.output, submenu);
            self.output.push_str("</b>");
            self.output.push_str(CARET);
        }
        self.output.push_str("<b class=\"menuitem\">");
        push_escaped(&mut self.output, last);
        self.output.push_str("</b></span>");
    }

    fn footnote(&mut self, m: &Macro) {
        let id = m.options.id();
        if let Some(id) = id
            && let Some(index) = self
                .footnotes
                .iter()
                .position(|f| f.id.as_deref() == Some(id))
        {
            let n = index + 1;
            write!(
                self.output,
                "<sup class=\"footnoteref\">[<a class=\"footnote\" href=\"#_footnotedef_{n}\" title=\"View footnote.\">{n}</a>]</sup>"
            )
            .unwrap();
            return;
        }
        if m.target.is_empty() {
            let id = id.unwrap_or_default();
            tracing::warn!(id, "Unresolved footnote reference");
            self.output.push_str(
                "<sup class=\"footnoteref red\" title=\"Unresolved footnote reference.\">[",
            );
            push_escaped(&mut self.output, id);
            self.output.push_str("]</sup>");
            self.warn(format!("Unresolved footnote reference: {id}"));
            return;
        }

        self.footnotes.push(Footnote {
            id: id.map(str::to_owned),
            text: m.target.clone(),
        });
        let n = self.footnotes.len();
        self.output.push_str("<sup class=\"footnote\"");
        if let Some(id) = id {
            self.output.push_str(" id=\"_footnote_");
            push_escaped(&mut self.output, id);
            self.output.push('"');
        }
        write!(
            self.output,
            ">[<a id=\"_footnoteref_{n}\" class=\"footnote\" href=\"#_footnotedef_{n}\" title=\"View footnote.\">{n}</a>]</sup>"
        )
        .unwrap();
    }

    /// `<div id="footnotes">` after the body.
    pub(super) fn write_footnotes(&mut self) {
        if self.footnotes.is_empty() {
            return;
        }
        self.output.push_str(" <div id=\"footnotes\">\n <hr>\n");
        for (index, footnote) in self.footnotes.iter().enumerate() {
            let n = index + 1;
            write!(
                self.output,
                " <div class=\"footnote\" id=\"_footnotedef_{n}\">\n <a href=\"#_footnoteref_{n}\">{n}</a>. "
            )
            .unwrap();
            push_escaped(&mut self.output, &footnote.text);
            self.output.push_str("\n </div>\n");
        }
        self.output.push_str(" </div>\n");
    }

    /// `xref:` to another document (`.adoc` becomes `.html`) or to an id in this one.
    fn xref(&mut self, m: &Macro) {
        let label = m.options.positional(1).filter(|l| !l.is_empty());
        if !m.target.contains(".adoc") {
            self.anchor(m.target.trim_start_matches('#'), label);
            return;
        }
        self.output.push_str("<a href=\"");
        push_escaped(&mut self.output, &adoc_to_html(&m.target));
        self.output.push_str("\">");
        push_escaped(&mut self.output, label.unwrap_or(&m.target));
        self.output.push_str("</a>");
    }

    fn inline_stem(&mut self, m: &Macro) {
        self.has_stem = true;
        let (open, close) = if self.is_latex(m.options.get("notation")) {
            ("\\(", "\\)")
        } else {
            ("\\$", "\\$")
        };
        self.output.push_str(open);
        push_escaped(&mut self.output, &m.target);
        self.output.push_str(close);
    }

    /// Whether `notation` (or the `stem` attribute for plain `stem`) is LaTeX.
    pub(super) fn is_latex(&self, notation: Option<&str>) -> bool {
        match notation {
            Some("latexmath") => true,
            Some("asciimath") => false,
            _ => self.attributes.get("stem") == Some("latexmath"),
        }
    }
}

/// `guide.adoc#part` to `guide.html#part`.
fn adoc_to_html(target: &str) -> String {
    let (page, fragment) = match target.split_once('#') {
        Some((page, fragment)) => (page, Some(fragment)),
        None => (target, None),
    };
    let page = page
        .strip_suffix(".adoc")
        .map_or_else(|| page.to_owned(), |stem| format!("{stem}.html"));
    match fragment {
        Some(fragment) => format!("{page}#{fragment}"),
        None => page,
    }
}

/// Alt text from the file name: `images/my-logo.png` gives `my logo`.
fn default_alt(target: &str) -> String {
    let name = target.rsplit('/').next().unwrap_or(target);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.replace(['-', '_'], " ")
}
