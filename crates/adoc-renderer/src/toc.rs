//! Table of contents.

use std::fmt::Write;

use crate::anchors::CollectedSection;
use crate::escape::push_escaped;

/// Default number of section levels listed.
pub(crate) const DEFAULT_TOC_LEVELS: usize = 2;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Depth in the outline: 1 for `==` sections.
    pub level: usize,
    /// Section title without markup.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Entries for shown sections down to `levels` deep.
pub(crate) fn toc_entries(sections: &[CollectedSection], levels: usize) -> Vec<TocEntry> {
    sections
        .iter()
        .filter(|s| s.active)
        .filter_map(|s| {
            let depth = s.level.checked_sub(1)?;
            (1..=levels).contains(&depth).then(|| TocEntry {
                level: depth,
                title: s.title.clone(),
                id: s.id.clone(),
            })
        })
        .collect()
}

/// Write the `<div id="toc">` block.
pub(crate) fn write_toc(out: &mut String, entries: &[TocEntry], title: &str, class: &str) {
    out.push_str(" <div id=\"toc\" class=\"");
    push_escaped(out, class);
    out.push_str("\">\n  <div id=\"toctitle\">");
    push_escaped(out, title);
    out.push_str("</div>\n");
    write_list(out, entries);
    out.push_str(" </div>\n");
}

/// Nested `<ul>` for `entries`; the first entry sets the list level.
fn write_list(out: &mut String, entries: &[TocEntry]) {
    let Some(first) = entries.first() else {
        return;
    };
    let level = first.level;
    writeln!(out, " <ul class=\"sectlevel{level}\">").unwrap();

    let mut i = 0;
    while i < entries.len() {
        let entry = &entries[i];
        let end = entries[i + 1..]
            .iter()
            .position(|e| e.level <= level)
            .map_or(entries.len(), |p| i + 1 + p);

        out.push_str("  <li><a href=\"#");
        push_escaped(out, &entry.id);
        out.push_str("\">");
        push_escaped(out, &entry.title);
        out.push_str("</a>");
        if end > i + 1 {
            out.push('\n');
            write_list(out, &entries[i + 1..end]);
            out.push_str("  </li>\n");
        } else {
            out.push_str("</li>\n");
        }
        i = end;
    }
    out.push_str(" </ul>\n");
}
