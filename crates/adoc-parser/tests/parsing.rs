//! Parsing against real files on disk.

use std::fs;

use adoc_model::{Element, ElementKind, Section};
use adoc_parser::{FsContentResolver, ParseErrorKind, Parser, ParserContext};
use pretty_assertions::assert_eq;

fn sections(elements: &[Element]) -> Vec<&Section> {
    elements
        .iter()
        .filter_map(|e| match e {
            Element::Section(s) => Some(s),
            _ => None,
        })
        .collect()
}

/// Every nested section is exactly one level deeper than its parent.
fn assert_levels_nest(parent_level: usize, elements: &[Element]) {
    for section in sections(elements) {
        assert_eq!(section.level, parent_level + 1);
        assert_levels_nest(section.level, &section.children);
    }
}

#[test]
fn test_includes_resolve_relative_to_including_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::create_dir(temp_dir.path().join("chapters")).unwrap();
    fs::write(
        temp_dir.path().join("chapters/one.adoc"),
        "== One\n\ninclude::detail.adoc[]",
    )
    .unwrap();
    fs::write(temp_dir.path().join("chapters/detail.adoc"), "Detail text.").unwrap();

    let resolver = FsContentResolver::new(temp_dir.path());
    let document = Parser::new()
        .parse("= Book\n\ninclude::chapters/one.adoc[]", &ParserContext::new(&resolver))
        .unwrap();

    let top = sections(&document.body);
    assert_eq!(top.len(), 1);
    let Element::Paragraph(p) = &top[0].children[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(p.children, vec![Element::text("Detail text.")]);
}

#[test]
fn test_include_outside_base_dir_is_unresolved() {
    let temp_dir = tempfile::tempdir().unwrap();
    let base = temp_dir.path().join("docs");
    fs::create_dir(&base).unwrap();
    fs::write(temp_dir.path().join("secret.adoc"), "secret").unwrap();

    let resolver = FsContentResolver::new(&base);
    let error = Parser::new()
        .parse("include::../secret.adoc[]", &ParserContext::new(&resolver))
        .unwrap_err();
    assert_eq!(error.kind(), ParseErrorKind::Resolution);
}

#[test]
fn test_optional_include_is_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let resolver = FsContentResolver::new(temp_dir.path());
    let document = Parser::new()
        .parse(
            "before\n\ninclude::missing.adoc[opts=optional]\n\nafter",
            &ParserContext::new(&resolver),
        )
        .unwrap();
    assert_eq!(document.body.len(), 2);
}

#[test]
fn test_section_levels_nest_and_reparse_identically() {
    let source = "= Doc\n\n== A\n\n=== A.1\n\n==== A.1.1\n\ntext\n\n=== A.2\n\n== B\n\n=== B.1";
    let parser = Parser::new();
    let context = ParserContext::default();

    let first = parser.parse(source, &context).unwrap();
    assert_levels_nest(1, &first.body);
    assert_eq!(sections(&first.body).len(), 2);

    let second = parser.parse(source, &context).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unterminated_delimited_blocks() {
    let parser = Parser::new();
    let context = ParserContext::default();
    for (source, line) in [
        ("----\ncode", 1),
        ("intro\n\n====\nexample", 3),
        ("|===\n|a\n", 1),
        ("ifdef::x[]\ntext", 1),
    ] {
        let error = parser.parse(source, &context).unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::Syntax, "{source:?}");
        assert_eq!(error.line(), line, "{source:?}");
    }
}

#[test]
fn test_inline_parsing_never_panics() {
    let parser = Parser::new();
    for text in [
        "*", "**", "_*`", "<<", "<<>>", "[[", "]]", "link:[]", "footnote:[", "https://",
        "a^b~c", "`+`", "\\", "{", "{}", "kbd:[+]", "image:[", "pass:[<b>", "é*ü*ß",
    ] {
        let elements = parser.parse_inline(text);
        assert!(elements.iter().all(|e| e.kind() != ElementKind::Section));
    }
}
