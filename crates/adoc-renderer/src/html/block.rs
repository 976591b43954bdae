//! Block-level emission.

use std::fmt::Write;
use std::sync::LazyLock;

use adoc_model::{
    Admonition, CallOut, CellStyle, Code, ConditionalBlock, DescriptionList, Element, List,
    Listing, OpenBlock, Paragraph, PassthroughBlock, Quote, Section, Table, TableRow, plain_text,
};
use regex::Regex;

use super::HtmlRenderer;
use crate::anchors::count_sections;
use crate::escape::push_escaped;
use crate::ids::id_for_title;

/// Trailing `<N>` callout marker of a code line.
static TRAILING_CALLOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*<(\d+)>$").unwrap());

impl HtmlRenderer {
    pub(super) fn section(&mut self, section: &Section) {
        let id = self.anchors.sections().get(self.next_section).map_or_else(
            || id_for_title(&plain_text(&section.title), "_", "_"),
            |s| s.id.clone(),
        );
        self.next_section += 1;

        let heading = (section.level).clamp(1, 6);
        let class = format!("sect{}", section.level.saturating_sub(1));
        let tag = self.config.section_tag.clone();

        write!(self.output, " <{tag}").unwrap();
        self.write_attributes_with_id(&section.options, &class, Some(&id));
        self.output.push_str(">\n");
        write!(self.output, "  <h{heading}>").unwrap();
        self.elements(&section.title);
        writeln!(self.output, "</h{heading}>").unwrap();

        if self.config.skip_section_body {
            self.elements(&section.children);
        } else {
            self.output.push_str(" <div class=\"sectionbody\">\n");
            self.elements(&section.children);
            self.output.push_str(" </div>\n");
        }
        writeln!(self.output, " </{tag}>").unwrap();
    }

    pub(super) fn paragraph(&mut self, paragraph: &Paragraph) {
        self.output.push_str(" <div");
        self.write_attributes(&paragraph.options, "paragraph");
        self.output.push_str(">\n");
        self.block_title(&paragraph.options);
        self.output.push_str(" <p>");
        self.elements(&paragraph.children);
        self.output.push_str("</p>\n </div>\n");
    }

    /// Content of list items: bare paragraphs collapse to `<p>`.
    fn item_content(&mut self, children: &[Element]) {
        for child in children {
            match child {
                Element::Paragraph(p) if p.options.is_empty() => {
                    self.output.push_str(" <p>");
                    self.elements(&p.children);
                    self.output.push_str("</p>\n");
                }
                other => self.element(other),
            }
        }
    }

    pub(super) fn code_block(&mut self, code: &Code) {
        let language = code.language.as_deref().filter(|l| !l.is_empty());
        self.output.push_str(" <div");
        self.write_attributes(&code.options, "listingblock");
        self.output.push_str(">\n");
        self.block_title(&code.options);

        let linenums =
            code.options.has_option("linenums") || code.options.positional(3) == Some("linenums");
        self.output.push_str(" <div class=\"content\">\n <pre class=\"highlightjs highlight");
        if linenums {
            self.output.push_str(" linenums");
        }
        self.output.push_str("\">");
        match language {
            Some(language) => {
                self.output.push_str("<code class=\"language-");
                push_escaped(&mut self.output, language);
                self.output.push_str(" hljs\" data-lang=\"");
                push_escaped(&mut self.output, language);
                self.output.push_str("\">");
            }
            None => self.output.push_str("<code class=\"hljs\">"),
        }
        for (index, line) in code.lines.iter().enumerate() {
            if index > 0 {
                self.output.push('\n');
            }
            self.code_line(line);
        }
        self.output.push_str("</code></pre>\n </div>\n </div>\n");

        if !code.callouts.is_empty() {
            self.callout_list(&code.callouts);
        }
    }

    /// One code line, with trailing `<N>` markers turned into callout badges.
    fn code_line(&mut self, line: &str) {
        let mut rest = line.trim_end();
        let mut numbers = Vec::new();
        while let Some(caps) = TRAILING_CALLOUT.captures(rest) {
            numbers.push(caps[1].to_owned());
            rest = &rest[..caps.get(0).map_or(rest.len(), |m| m.start())];
        }
        if numbers.is_empty() {
            push_escaped(&mut self.output, line);
            return;
        }
        push_escaped(&mut self.output, rest);
        for number in numbers.iter().rev() {
            write!(self.output, " <b class=\"conum\">({number})</b>").unwrap();
        }
    }

    fn callout_list(&mut self, callouts: &[CallOut]) {
        self.output
            .push_str(" <div class=\"colist arabic\">\n <ol>\n");
        for callout in callouts {
            self.output.push_str("  <li>\n <p>");
            self.elements(&callout.text);
            self.output.push_str("</p>\n  </li>\n");
        }
        self.output.push_str(" </ol>\n </div>\n");
    }

    pub(super) fn listing(&mut self, listing: &Listing) {
        let class = match listing.style.as_deref() {
            Some("literal") => "literalblock",
            _ => "listingblock",
        };
        self.output.push_str(" <div");
        self.write_attributes(&listing.options, class);
        self.output.push_str(">\n");
        self.block_title(&listing.options);
        self.output.push_str(" <div class=\"content\">\n <pre>");
        push_escaped(&mut self.output, &listing.lines.join("\n"));
        self.output.push_str("</pre>\n </div>\n </div>\n");
    }

    pub(super) fn unordered_list(&mut self, list: &List) {
        self.output.push_str(" <div");
        self.write_attributes(&list.options, "ulist");
        self.output.push_str(">\n");
        self.block_title(&list.options);
        self.output.push_str(" <ul>\n");
        for item in &list.items {
            self.output.push_str("  <li>\n");
            self.item_content(&item.children);
            self.output.push_str("  </li>\n");
        }
        self.output.push_str(" </ul>\n </div>\n");
    }

    pub(super) fn ordered_list(&mut self, list: &List) {
        let numbering = list.options.positional(1).unwrap_or("arabic");
        self.output.push_str(" <div");
        self.write_attributes(&list.options, &format!("olist {numbering}"));
        self.output.push_str(">\n");
        self.block_title(&list.options);
        self.output.push_str(" <ol class=\"");
        push_escaped(&mut self.output, numbering);
        self.output.push('"');
        if let Some(start) = list.options.get("start") {
            self.output.push_str(" start=\"");
            push_escaped(&mut self.output, start);
            self.output.push('"');
        }
        if list.options.has_option("reversed") {
            self.output.push_str(" reversed");
        }
        self.output.push_str(">\n");
        for item in &list.items {
            self.output.push_str("  <li>\n");
            self.item_content(&item.children);
            self.output.push_str("  </li>\n");
        }
        self.output.push_str(" </ol>\n </div>\n");
    }

    pub(super) fn description_list(&mut self, list: &DescriptionList) {
        self.output.push_str(" <div");
        self.write_attributes(&list.options, "dlist");
        self.output.push_str(">\n");
        self.block_title(&list.options);
        self.output.push_str(" <dl>\n");
        for item in &list.items {
            self.output.push_str("  <dt class=\"hdlist1\">");
            self.elements(&item.term);
            self.output.push_str("</dt>\n");
            if !item.description.is_empty() {
                self.output.push_str("  <dd>\n");
                self.item_content(&item.description);
                self.output.push_str("  </dd>\n");
            }
        }
        self.output.push_str(" </dl>\n </div>\n");
    }

    pub(super) fn admonition(&mut self, admonition: &Admonition) {
        let caption_attribute = format!("{}-caption", admonition.kind.class());
        let caption = self
            .attributes
            .get(&caption_attribute)
            .unwrap_or(admonition.kind.label())
            .to_owned();

        self.output.push_str(" <div");
        self.write_attributes(
            &admonition.options,
            &format!("admonitionblock {}", admonition.kind.class()),
        );
        self.output.push_str(
            ">\n <table>\n <tr>\n <td class=\"icon\">\n  <div class=\"title\">",
        );
        push_escaped(&mut self.output, &caption);
        self.output
            .push_str("</div>\n </td>\n <td class=\"content\">\n");
        self.block_title(&admonition.options);
        match admonition.children.as_slice() {
            [Element::Paragraph(p)] if p.options.is_empty() => {
                self.elements(&p.children);
                self.output.push('\n');
            }
            children => self.elements(children),
        }
        self.output.push_str(" </td>\n </tr>\n </table>\n </div>\n");
    }

    pub(super) fn table(&mut self, table: &Table) {
        let frame = table
            .options
            .get("frame")
            .or_else(|| self.attributes.get("table-frame"))
            .unwrap_or("all")
            .to_owned();
        let grid = table
            .options
            .get("grid")
            .or_else(|| self.attributes.get("table-grid"))
            .unwrap_or("all")
            .to_owned();
        let autowidth = table.options.has_option("autowidth");

        let mut class = format!("tableblock frame-{frame} grid-{grid}");
        if let Some(stripes) = table
            .options
            .get("stripes")
            .or_else(|| self.attributes.get("table-stripes"))
        {
            write!(class, " stripes-{stripes}").unwrap();
        }
        class.push_str(if autowidth { " fit-content" } else { " stretch" });

        self.output.push_str(" <table");
        self.write_attributes(&table.options, &class);
        self.output.push_str(">\n");
        if let Some(title) = table.options.title() {
            self.output.push_str("  <caption class=\"title\">");
            push_escaped(&mut self.output, title);
            self.output.push_str("</caption>\n");
        }

        self.output.push_str("  <colgroup>\n");
        for width in column_widths(table) {
            match width {
                Some(width) => writeln!(self.output, "   <col width=\"{width}%\">").unwrap(),
                None => self.output.push_str("   <col>\n"),
            }
        }
        self.output.push_str("  </colgroup>\n");

        let (head, body): (Vec<&TableRow>, Vec<&TableRow>) =
            table.rows.iter().partition(|row| row.header);
        if !head.is_empty() {
            self.output.push_str("  <thead>\n");
            for row in head {
                self.table_row(row);
            }
            self.output.push_str("  </thead>\n");
        }
        if !body.is_empty() {
            self.output.push_str("  <tbody>\n");
            for row in body {
                self.table_row(row);
            }
            self.output.push_str("  </tbody>\n");
        }
        self.output.push_str(" </table>\n");
    }

    fn table_row(&mut self, row: &TableRow) {
        self.output.push_str("   <tr>\n");
        for cell in &row.cells {
            let tag = if row.header || cell.style == CellStyle::Header {
                "th"
            } else {
                "td"
            };
            write!(
                self.output,
                "    <{tag} class=\"tableblock halign-left valign-top\">"
            )
            .unwrap();
            if row.header {
                self.header_cell(&cell.children);
            } else {
                self.body_cell(&cell.children, cell.style);
            }
            writeln!(self.output, "</{tag}>").unwrap();
        }
        self.output.push_str("   </tr>\n");
    }

    fn header_cell(&mut self, children: &[Element]) {
        for child in children {
            match child {
                Element::Paragraph(p) => self.elements(&p.children),
                other => self.element(other),
            }
        }
    }

    fn body_cell(&mut self, children: &[Element], style: CellStyle) {
        match style {
            CellStyle::AsciiDoc => {
                self.output.push_str("<div class=\"content\">\n");
                self.elements(children);
                self.output.push_str("</div>");
            }
            CellStyle::Literal => {
                self.output.push_str("<div class=\"literal\"><pre>");
                for child in children {
                    match child {
                        Element::Listing(listing) => {
                            push_escaped(&mut self.output, &listing.lines.join("\n"));
                        }
                        other => {
                            let other = std::slice::from_ref(other);
                            self.next_section += count_sections(other);
                            push_escaped(&mut self.output, &plain_text(other));
                        }
                    }
                }
                self.output.push_str("</pre></div>");
            }
            CellStyle::Default
            | CellStyle::Emphasis
            | CellStyle::Strong
            | CellStyle::Monospace
            | CellStyle::Header => {
                let tag = match style {
                    CellStyle::Emphasis => Some("em"),
                    CellStyle::Strong => Some("strong"),
                    CellStyle::Monospace => Some("code"),
                    _ => None,
                };
                for child in children {
                    let Element::Paragraph(p) = child else {
                        self.element(child);
                        continue;
                    };
                    self.output.push_str("<p class=\"tableblock\">");
                    if let Some(tag) = tag {
                        write!(self.output, "<{tag}>").unwrap();
                    }
                    self.elements(&p.children);
                    if let Some(tag) = tag {
                        write!(self.output, "</{tag}>").unwrap();
                    }
                    self.output.push_str("</p>");
                }
            }
        }
    }

    pub(super) fn quote(&mut self, quote: &Quote) {
        let verse = quote.options.positional(1) == Some("verse");
        self.output.push_str(" <div");
        self.write_attributes(
            &quote.options,
            if verse { "verseblock" } else { "quoteblock" },
        );
        self.output.push_str(">\n");
        self.block_title(&quote.options);
        if verse {
            self.output.push_str(" <pre class=\"content\">");
            for (index, child) in quote.children.iter().enumerate() {
                if index > 0 {
                    self.output.push_str("\n\n");
                }
                match child {
                    Element::Paragraph(p) => self.elements(&p.children),
                    other => self.element(other),
                }
            }
            self.output.push_str("</pre>\n");
        } else {
            self.output.push_str(" <blockquote>\n");
            self.elements(&quote.children);
            self.output.push_str(" </blockquote>\n");
        }

        if quote.attribution.is_some() || quote.citetitle.is_some() {
            self.output.push_str(" <div class=\"attribution\">\n");
            if let Some(attribution) = &quote.attribution {
                self.output.push_str(" &#8212; ");
                push_escaped(&mut self.output, attribution);
                if quote.citetitle.is_some() {
                    self.output.push_str("<br>");
                }
                self.output.push('\n');
            }
            if let Some(citetitle) = &quote.citetitle {
                self.output.push_str(" <cite>");
                push_escaped(&mut self.output, citetitle);
                self.output.push_str("</cite>\n");
            }
            self.output.push_str(" </div>\n");
        }
        self.output.push_str(" </div>\n");
    }

    pub(super) fn open_block(&mut self, block: &OpenBlock) {
        let options = &block.options;
        if options.has_option("collapsible") {
            self.output.push_str(" <details");
            self.write_attributes(options, "");
            if options.has_option("open") {
                self.output.push_str(" open");
            }
            self.output.push_str(">\n  <summary class=\"title\">");
            push_escaped(&mut self.output, options.title().unwrap_or("Details"));
            self.output
                .push_str("</summary>\n <div class=\"content\">\n");
            self.elements(&block.children);
            self.output.push_str(" </div>\n </details>\n");
            return;
        }

        match options.positional(1) {
            Some("abstract") => {
                self.output.push_str(" <div");
                self.write_attributes(options, "quoteblock abstract");
                self.output.push_str(">\n");
                self.block_title(options);
                self.output.push_str(" <blockquote>\n");
                self.elements(&block.children);
                self.output.push_str(" </blockquote>\n </div>\n");
            }
            Some("sidebar") => {
                self.output.push_str(" <div");
                self.write_attributes(options, "sidebarblock");
                self.output.push_str(">\n <div class=\"content\">\n");
                self.block_title(options);
                self.elements(&block.children);
                self.output.push_str(" </div>\n </div>\n");
            }
            style => {
                let class = match style {
                    Some("example") => "exampleblock",
                    Some("partintro") => "openblock partintro",
                    _ => "openblock",
                };
                self.output.push_str(" <div");
                self.write_attributes(options, class);
                self.output.push_str(">\n");
                self.block_title(options);
                self.output.push_str(" <div class=\"content\">\n");
                self.elements(&block.children);
                self.output.push_str(" </div>\n </div>\n");
            }
        }
    }

    pub(super) fn passthrough_block(&mut self, block: &PassthroughBlock) {
        match block.options.positional(1) {
            Some(notation @ ("stem" | "latexmath" | "asciimath")) => {
                let latex = self.is_latex(Some(notation));
                self.has_stem = true;
                self.output.push_str(" <div");
                self.write_attributes(&block.options, "stemblock");
                self.output.push_str(">\n");
                self.block_title(&block.options);
                self.output.push_str(" <div class=\"content\">\n");
                let (open, close) = if latex { ("\\[", "\\]") } else { ("\\$", "\\$") };
                self.output.push_str(open);
                push_escaped(&mut self.output, block.content.trim());
                self.output.push_str(close);
                self.output.push_str("\n </div>\n </div>\n");
            }
            _ => {
                self.output.push_str(&block.content);
                if !block.content.ends_with('\n') {
                    self.output.push('\n');
                }
            }
        }
    }

    pub(super) fn conditional(&mut self, block: &ConditionalBlock) {
        let holds = block.condition.test(&self.attributes);
        tracing::trace!(holds, "Evaluated conditional block");
        if holds {
            self.elements(&block.children);
        } else {
            self.next_section += count_sections(&block.children);
        }
    }
}

/// Column widths in percent, `None` for autowidth tables.
///
/// The last column absorbs rounding so the widths add up to 100.
fn column_widths(table: &Table) -> Vec<Option<u64>> {
    if table.options.has_option("autowidth") {
        return vec![None; table.columns.len()];
    }
    let total: u64 = table
        .columns
        .iter()
        .map(|c| u64::from(c.width))
        .sum::<u64>()
        .max(1);
    let mut remaining = 100u64;
    let last = table.columns.len().saturating_sub(1);
    table
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let width = if index == last {
                remaining
            } else {
                (u64::from(column.width) * 100 / total).min(remaining)
            };
            remaining -= width;
            Some(width)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adoc_model::{ColumnSpec, Options};
    use pretty_assertions::assert_eq;

    fn table(widths: &[u32], options: Options) -> Table {
        Table {
            columns: widths
                .iter()
                .map(|&width| ColumnSpec {
                    width,
                    style: CellStyle::Default,
                })
                .collect(),
            rows: Vec::new(),
            options,
        }
    }

    #[test]
    fn test_column_widths_sum_to_hundred() {
        assert_eq!(
            column_widths(&table(&[1, 1, 1], Options::new())),
            vec![Some(33), Some(33), Some(34)]
        );
        assert_eq!(
            column_widths(&table(&[1, 3], Options::new())),
            vec![Some(25), Some(75)]
        );
    }

    #[test]
    fn test_column_widths_with_large_values() {
        assert_eq!(
            column_widths(&table(&[u32::MAX, u32::MAX], Options::new())),
            vec![Some(50), Some(50)]
        );
    }

    #[test]
    fn test_autowidth_columns_have_no_width() {
        let options = Options::new().with("autowidth-option", "");
        assert_eq!(column_widths(&table(&[1, 2], options)), vec![None, None]);
    }
}
