//! `|===` tables.
//!
//! Cells are separated by unescaped `|`. A cell may be prefixed by a spec
//! such as `a|`, `2+|` or `^.>s|`; only the style letter is kept. Cells are
//! grouped into rows by the column count, taken from `cols` or from the
//! number of cells on the first line.

use std::sync::LazyLock;

use adoc_model::{
    CellStyle, ColumnSpec, Element, Listing, Options, Paragraph, Table, TableCell, TableRow,
};
use regex::Regex;

use super::BlockParser;
use crate::error::ParseError;
use crate::reader::{Line, Reader};

static CELL_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)?[+*])?[<^>]?(?:\.[<^>])?([aehlmsdv])?$").unwrap()
});

static COLUMN_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\*)?[<^>]?(?:\.[<^>])?(\d+)?%?([aehlmsdv])?$").unwrap()
});

/// Cell text before inline parsing.
struct RawCell {
    text: String,
    style: Option<CellStyle>,
    /// Line the cell starts on, for nested parse positions.
    line: Line,
}

fn style_from_letter(letter: &str) -> CellStyle {
    match letter {
        "a" => CellStyle::AsciiDoc,
        "e" => CellStyle::Emphasis,
        "h" => CellStyle::Header,
        "l" => CellStyle::Literal,
        "m" => CellStyle::Monospace,
        "s" => CellStyle::Strong,
        _ => CellStyle::Default,
    }
}

/// Upper bound on the column count a `cols` value may declare.
const MAX_COLUMNS: usize = 1024;

/// Parse a `cols` value: `3`, `1,2`, `2*,3`, `<1,^2s`, `25%,75%`.
///
/// Returns `None` when the value declares more than [`MAX_COLUMNS`] columns.
pub(super) fn parse_columns(spec: &str) -> Option<Vec<ColumnSpec>> {
    let entries: Vec<&str> = spec
        .split([',', ';'])
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect();

    if let [single] = entries.as_slice()
        && let Ok(count) = single.parse::<usize>()
    {
        return (count <= MAX_COLUMNS).then(|| vec![ColumnSpec::default(); count]);
    }

    let mut columns = Vec::new();
    for entry in entries {
        let Some(caps) = COLUMN_SPEC.captures(entry) else {
            columns.push(ColumnSpec::default());
            continue;
        };
        let repeat = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(1);
        let column = ColumnSpec {
            width: caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1),
            style: caps
                .get(3)
                .map_or(CellStyle::Default, |m| style_from_letter(m.as_str())),
        };
        if repeat > MAX_COLUMNS - columns.len() {
            return None;
        }
        columns.extend(std::iter::repeat_n(column, repeat));
    }
    Some(columns)
}

/// Split on `|` not preceded by `\`, unescaping `\|`.
fn split_unescaped(text: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                chars.next();
                if let Some(last) = segments.last_mut() {
                    last.push('|');
                }
            }
            '|' => segments.push(String::new()),
            _ => {
                if let Some(last) = segments.last_mut() {
                    last.push(c);
                }
            }
        }
    }
    segments
}

/// Strip a trailing cell spec (`a`, `2+`, `^s`) belonging to the next cell.
///
/// The spec must touch the separator: in `|a |b` the `a` is cell text.
/// Returns the remaining text and, when a spec was found, its style.
fn strip_cell_spec(segment: &str) -> (&str, Option<Option<CellStyle>>) {
    let (head, token) = match segment.rfind([' ', '\t']) {
        Some(pos) => (&segment[..pos], &segment[pos + 1..]),
        None => ("", segment),
    };
    if token.is_empty() {
        return (segment, None);
    }
    match CELL_SPEC.captures(token) {
        Some(caps) => (head, Some(caps.get(1).map(|m| style_from_letter(m.as_str())))),
        None => (segment, None),
    }
}

fn split_cells(lines: &[Line]) -> Vec<RawCell> {
    let mut cells: Vec<RawCell> = Vec::new();
    for line in lines {
        let segments = split_unescaped(&line.text);
        if segments.len() == 1 {
            if let Some(cell) = cells.last_mut() {
                cell.text.push('\n');
                cell.text.push_str(&segments[0]);
            }
            continue;
        }

        let mut style = None;
        let last = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            let (content, spec) = if index < last {
                strip_cell_spec(segment)
            } else {
                (segment.as_str(), None)
            };
            if index == 0 {
                if !content.trim().is_empty()
                    && let Some(cell) = cells.last_mut()
                {
                    cell.text.push('\n');
                    cell.text.push_str(content.trim());
                }
            } else {
                cells.push(RawCell {
                    text: content.trim().to_owned(),
                    style,
                    line: line.clone(),
                });
            }
            style = spec.flatten();
        }
    }
    cells
}

impl BlockParser {
    pub(super) fn parse_table(
        &mut self,
        reader: &mut Reader,
        opening: &Line,
        options: Options,
    ) -> Result<Element, ParseError> {
        let lines = reader.read_until_delimiter(opening, "|===", "table")?;

        let first = lines.iter().position(|l| !l.text.trim().is_empty());
        let first_line_cells = first
            .map(|i| split_unescaped(&lines[i].text).len().saturating_sub(1))
            .unwrap_or(0);
        let implicit_header = first.is_some_and(|i| {
            first_line_cells > 0
                && lines.get(i + 1).is_some_and(|l| l.text.trim().is_empty())
                && lines[i + 2..].iter().any(|l| !l.text.trim().is_empty())
        });
        let header = !options.has_option("noheader")
            && (options.has_option("header") || implicit_header);

        let mut columns = match options.get("cols") {
            Some(cols) => parse_columns(cols).ok_or_else(|| {
                opening.syntax_error(format!(
                    "table declares more than {MAX_COLUMNS} columns: cols={cols}"
                ))
            })?,
            None => Vec::new(),
        };
        if columns.is_empty() {
            columns = vec![ColumnSpec::default(); first_line_cells.max(1)];
        }

        let raw = split_cells(&lines);
        let mut cells = Vec::with_capacity(raw.len());
        for (index, cell) in raw.into_iter().enumerate() {
            let column = columns[index % columns.len()];
            let style = cell.style.unwrap_or(column.style);
            cells.push(self.table_cell(cell, style)?);
        }

        let mut rows = Vec::new();
        let mut iter = cells.into_iter();
        loop {
            let mut row: Vec<TableCell> = iter.by_ref().take(columns.len()).collect();
            if row.is_empty() {
                break;
            }
            if row.len() < columns.len() {
                tracing::debug!(
                    line = opening.number,
                    cells = row.len(),
                    columns = columns.len(),
                    "Padding incomplete table row"
                );
                row.resize_with(columns.len(), || TableCell {
                    children: Vec::new(),
                    style: CellStyle::Default,
                });
            }
            rows.push(TableRow {
                header: header && rows.is_empty(),
                cells: row,
            });
        }

        Ok(Element::Table(Table {
            columns,
            rows,
            options,
        }))
    }

    fn table_cell(&mut self, cell: RawCell, style: CellStyle) -> Result<TableCell, ParseError> {
        let children = match style {
            CellStyle::AsciiDoc => {
                let lines = cell
                    .text
                    .lines()
                    .enumerate()
                    .map(|(i, text)| Line {
                        text: text.to_owned(),
                        number: cell.line.number + i,
                        ..cell.line.clone()
                    })
                    .collect();
                self.parse_nested(lines)?
            }
            CellStyle::Literal => vec![Element::Listing(Listing {
                style: Some("literal".to_owned()),
                lines: cell.text.lines().map(str::to_owned).collect(),
                options: Options::new(),
            })],
            _ => cell
                .text
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    Element::Paragraph(Paragraph {
                        children: self.inline(p),
                        options: Options::new(),
                    })
                })
                .collect(),
        };
        Ok(TableCell { children, style })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn parse_table(source: &str) -> Table {
        let mut reader = Reader::from_text(source, 1);
        let elements = BlockParser::new(BTreeMap::new())
            .parse_blocks(&mut reader, None)
            .unwrap();
        match elements.into_iter().next() {
            Some(Element::Table(table)) => table,
            other => panic!("expected table, got {other:?}"),
        }
    }

    fn cell_text(cell: &TableCell) -> String {
        adoc_model::plain_text(&cell.children)
    }

    #[test]
    fn test_implicit_header() {
        let table = parse_table("|===\n|Name |Value\n\n|a |1\n|===");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].header);
        assert!(!table.rows[1].header);
        assert_eq!(cell_text(&table.rows[0].cells[1]), "Value");
        assert_eq!(cell_text(&table.rows[1].cells[0]), "a");
    }

    #[test]
    fn test_no_header_without_blank_line() {
        let table = parse_table("|===\n|a |b\n|c |d\n|===");
        assert!(table.rows.iter().all(|r| !r.header));
    }

    #[test]
    fn test_cols_and_one_cell_per_line() {
        let table = parse_table("[cols=\"1,3\",options=header]\n|===\n|H1\n|H2\n|x\n|y\n|===");
        assert_eq!(
            table.columns,
            vec![
                ColumnSpec {
                    width: 1,
                    style: CellStyle::Default,
                },
                ColumnSpec {
                    width: 3,
                    style: CellStyle::Default,
                },
            ]
        );
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].header);
        assert_eq!(cell_text(&table.rows[1].cells[1]), "y");
    }

    #[test]
    fn test_asciidoc_cell() {
        let table = parse_table("[cols=\"1,1a\"]\n|===\n|text\n|* one\n* two\n|===");
        let cell = &table.rows[0].cells[1];
        assert_eq!(cell.style, CellStyle::AsciiDoc);
        assert!(matches!(cell.children[0], Element::UnOrderedList(_)));
    }

    #[test]
    fn test_cell_spec_overrides_column() {
        let table = parse_table("|===\ns|strong |plain\n|===");
        assert_eq!(table.rows[0].cells[0].style, CellStyle::Strong);
        assert_eq!(table.rows[0].cells[1].style, CellStyle::Default);
    }

    #[test]
    fn test_escaped_separator() {
        let table = parse_table("|===\n|a \\| b |c\n|===");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(cell_text(&table.rows[0].cells[0]), "a | b");
    }

    #[test]
    fn test_incomplete_row_is_padded() {
        let table = parse_table("[cols=2]\n|===\n|a |b\n|c\n|===");
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[1].cells[1].children.is_empty());
    }

    #[test]
    fn test_unterminated_table() {
        let mut reader = Reader::from_text("|===\n|a", 1);
        let error = BlockParser::new(BTreeMap::new())
            .parse_blocks(&mut reader, None)
            .unwrap_err();
        assert!(error.to_string().contains("unterminated table block"));
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("3").unwrap().len(), 3);
        let columns = parse_columns("2*a,1h").unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].style, CellStyle::AsciiDoc);
        assert_eq!(columns[2].style, CellStyle::Header);
        assert_eq!(parse_columns("25%,75%").unwrap()[1].width, 75);
    }

    #[test]
    fn test_parse_columns_rejects_excessive_counts() {
        assert_eq!(parse_columns("1024").map(|c| c.len()), Some(1024));
        assert!(parse_columns("999999999").is_none());
        assert!(parse_columns("999999999*").is_none());
        assert!(parse_columns("1000*,1000*").is_none());
    }

    #[test]
    fn test_excessive_cols_is_syntax_error() {
        let mut reader = Reader::from_text("[cols=\"999999999*\"]\n|===\n|a\n|===", 1);
        let error = BlockParser::new(BTreeMap::new())
            .parse_blocks(&mut reader, None)
            .unwrap_err();
        assert!(error.to_string().contains("more than 1024 columns"));
    }
}
