//! End-to-end rendering of parsed sources.

use adoc_model::{Element, plain_text};
use adoc_parser::{Parser, ParserContext};
use adoc_renderer::{Configuration, HtmlRenderer, RenderResult};
use pretty_assertions::assert_eq;
use regex::Regex;

fn render_with(source: &str, config: Configuration) -> RenderResult {
    let document = Parser::new()
        .parse(source, &ParserContext::default())
        .unwrap();
    HtmlRenderer::try_new(config).unwrap().render(&document)
}

fn render(source: &str) -> RenderResult {
    render_with(source, Configuration::default())
}

/// Body only, without the document shell.
fn render_body(source: &str) -> RenderResult {
    render_with(source, Configuration::default().with_attribute("noheader", ""))
}

/// Section titles indented by nesting depth.
fn outline(elements: &[Element], depth: usize, out: &mut Vec<String>) {
    for element in elements {
        if let Element::Section(section) = element {
            out.push(format!("{}{}", "  ".repeat(depth), plain_text(&section.title)));
            outline(&section.children, depth + 1, out);
        }
    }
}

fn parse_outline(source: &str) -> Vec<String> {
    let document = Parser::new()
        .parse(source, &ParserContext::default())
        .unwrap();
    let mut out = Vec::new();
    outline(&document.body, 0, &mut out);
    out
}

#[test]
fn test_title_inside_content_wrapper() {
    let result = render("= Title");
    assert!(result.html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">\n"));
    assert!(result.html.contains(" <div id=\"content\">\n <h1>Title</h1>\n"));
    assert!(result.html.ends_with("</body>\n</html>\n"));
    assert_eq!(result.title.as_deref(), Some("Title"));
}

#[test]
fn test_notitle_hides_heading() {
    let result = render("= Title\n:notitle:");
    assert!(!result.html.contains("<h1>"));
    assert_eq!(result.title.as_deref(), Some("Title"));
}

#[test]
fn test_section_markup() {
    let result = render_body("== Foo\n\nBar");
    assert_eq!(
        result.html,
        concat!(
            " <section class=\"sect1\" id=\"_foo\">\n",
            "  <h2>Foo</h2>\n",
            " <div class=\"sectionbody\">\n",
            " <div class=\"paragraph\">\n",
            " <p>Bar</p>\n",
            " </div>\n",
            " </div>\n",
            " </section>\n",
        )
    );
}

#[test]
fn test_custom_section_tag_without_body() {
    let config = Configuration::default()
        .with_attribute("noheader", "")
        .with_section_tag("div")
        .with_skip_section_body(true);
    let result = render_with("== Foo", config);
    assert_eq!(
        result.html,
        " <div class=\"sect1\" id=\"_foo\">\n  <h2>Foo</h2>\n </div>\n"
    );
}

#[test]
fn test_reference_by_title() {
    let result = render_body("== Foo\n\nSee <<Foo>>.");
    assert!(result.html.contains("<a href=\"#_foo\">Foo</a>"));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_forward_reference_resolves() {
    let result = render_body("See <<later,the end>>.\n\n[#later]\n== Later");
    assert!(result.html.contains("<a href=\"#later\">the end</a>"));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_unresolved_reference() {
    let result = render_body("See <<nowhere>>.");
    assert!(
        result
            .html
            .contains("<a href=\"#nowhere\" class=\"unresolved\">[nowhere]</a>")
    );
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("nowhere"));
}

#[test]
fn test_ifdef_follows_configuration() {
    let source = "ifdef::flag[]\nshown\nendif::flag[]\n\nalways";

    let without = render_body(source);
    assert!(!without.html.contains("shown"));
    assert!(without.html.contains("always"));

    let config = Configuration::default()
        .with_attribute("noheader", "")
        .with_attribute("flag", "");
    let with = render_with(source, config);
    let shown = " <div class=\"paragraph\">\n <p>shown</p>\n </div>\n";
    assert!(with.html.contains(shown));
    assert_eq!(with.html.replacen(shown, "", 1), without.html);
}

#[test]
fn test_anchor_in_inactive_branch_is_indexed() {
    let source = "ifdef::flag[]\n== Same\nendif::flag[]\n\n== Same\n\nSee <<_same>>.";
    let result = render_body(source);

    assert!(result.warnings.is_empty());
    assert!(result.html.contains("<a href=\"#_same\">Same</a>"));
    assert!(result.html.contains("id=\"_same_2\""));
    assert!(!result.html.contains("id=\"_same\""));
}

#[test]
fn test_body_entry_cannot_override_configuration() {
    let config = Configuration::default()
        .with_attribute("noheader", "")
        .with_attribute("env", "prod");
    let result = render_with(":env: dev\n\nifeval::[\"{env}\" == \"prod\"]\nproduction\nendif::[]", config);
    assert!(result.html.contains("production"));
}

#[test]
fn test_table_structure() {
    let result = render_body("[cols=\"1,1\"]\n|===\n|A |B\n\n|1 |2\n|===");
    let html = &result.html;
    assert_eq!(html.matches("<thead>").count(), 1);
    assert_eq!(html.matches("<tbody>").count(), 1);
    assert_eq!(html.matches("<col ").count(), 2);
    assert!(html.contains("<col width=\"50%\">"));
    assert!(html.contains("<th class=\"tableblock halign-left valign-top\">A</th>"));
    assert!(
        html.contains("<td class=\"tableblock halign-left valign-top\"><p class=\"tableblock\">2</p></td>")
    );
    assert!(html.contains("class=\"tableblock frame-all grid-all stretch\""));
}

#[test]
fn test_preamble_wraps_blocks_before_first_section() {
    let result = render("= Doc\n\nIntro.\n\n== A\n\nText.");
    let preamble = result.html.find("<div id=\"preamble\">").unwrap();
    let intro = result.html.find("Intro.").unwrap();
    let section = result.html.find("id=\"_a\"").unwrap();
    assert!(preamble < intro && intro < section);
}

#[test]
fn test_toc() {
    let result = render("= Doc\n:toc:\n\n== One\n\n=== One A\n\n==== Deep\n\n== Two");
    assert!(result.html.contains(" <div id=\"toc\" class=\"toc\">"));
    assert!(result.html.contains("<a href=\"#_one_a\">One A</a>"));
    assert!(!result.html.contains("<a href=\"#_deep\">"));

    let titles: Vec<_> = result.toc.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "One A", "Two"]);
}

#[test]
fn test_toc_entries_returned_without_toc_attribute() {
    let result = render("= Doc\n\n== One");
    assert!(!result.html.contains("id=\"toc\""));
    assert_eq!(result.toc.len(), 1);
}

#[test]
fn test_code_block_with_callouts() {
    let source = "[source,rust]\n----\nlet x = 1; <1>\n----\n<1> Binding";
    let result = render_body(source);
    assert!(result.html.contains(
        "<code class=\"language-rust hljs\" data-lang=\"rust\">let x = 1; <b class=\"conum\">(1)</b></code>"
    ));
    assert!(result.html.contains(" <div class=\"colist arabic\">\n <ol>\n  <li>\n <p>Binding</p>\n"));
}

#[test]
fn test_admonition() {
    let result = render_body("NOTE: Mind the gap.");
    assert!(result.html.contains("<div class=\"admonitionblock note\">"));
    assert!(result.html.contains("<div class=\"title\">NOTE</div>"));
    assert!(result.html.contains("Mind the gap."));
}

#[test]
fn test_footnotes_are_numbered() {
    let result = render_body("A footnote:[First] and footnote:[Second].");
    assert!(result.html.contains("href=\"#_footnotedef_2\""));
    assert!(result.html.contains(" <div id=\"footnotes\">"));
    assert!(result.html.contains("<a href=\"#_footnoteref_1\">1</a>. First"));
}

#[test]
fn test_inline_macros() {
    let result = render_body("Press kbd:[Ctrl+T] then btn:[OK].");
    assert!(
        result
            .html
            .contains("<span class=\"keyseq\"><kbd>Ctrl</kbd>+<kbd>T</kbd></span>")
    );
    assert!(result.html.contains("<b class=\"button\">OK</b>"));
}

#[test]
fn test_xref_to_other_document() {
    let result = render_body("See xref:guide.adoc#setup[Setup].");
    assert!(result.html.contains("<a href=\"guide.html#setup\">Setup</a>"));
}

#[test]
fn test_imagesdir_prefix() {
    let result = render_body(":imagesdir: img\n\nimage::logo.png[Logo]");
    assert!(result.html.contains("<img src=\"img/logo.png\" alt=\"Logo\">"));
    assert!(result.html.contains("<div class=\"imageblock\">"));
}

#[test]
fn test_data_uri_inlines_local_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("dot.png"), b"png").unwrap();

    let config = Configuration::default()
        .with_attribute("noheader", "")
        .with_attribute("data-uri", "")
        .with_assets_base(temp_dir.path());
    let result = render_with("image::dot.png[Dot]", config);
    assert!(result.html.contains("src=\"data:image/png;base64,cG5n\""));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_data_uri_missing_image_warns() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Configuration::default()
        .with_attribute("noheader", "")
        .with_attribute("data-uri", "")
        .with_assets_base(temp_dir.path());
    let result = render_with("image::missing.png[]", config);
    assert!(result.html.contains("src=\"missing.png\""));
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_escaping() {
    let result = render_body("a < b & \"c\"");
    assert!(result.html.contains("a &lt; b &amp; &quot;c&quot;"));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = Configuration::default().with_section_tag("not a tag");
    assert!(HtmlRenderer::try_new(config).is_err());
}

#[test]
fn test_rendered_headings_reparse_to_same_nesting() {
    let source = "== A\n\n=== A.1\n\n==== A.1.1\n\ntext\n\n=== A.2\n\n== B\n\n=== B.1";
    let html = render_body(source).html;

    let heading = Regex::new(r"<h(\d)>([^<]*)</h\d>").unwrap();
    let rebuilt: Vec<String> = heading
        .captures_iter(&html)
        .map(|caps| {
            let level: usize = caps[1].parse().unwrap();
            format!("{} {}", "=".repeat(level), &caps[2])
        })
        .collect();
    let rebuilt = rebuilt.join("\n\n");

    assert_eq!(parse_outline(&rebuilt), parse_outline(source));
    assert_eq!(
        parse_outline(source),
        vec!["A", "  A.1", "    A.1.1", "  A.2", "B", "  B.1"]
    );
}

#[test]
fn test_section_inside_verse_keeps_later_ids() {
    let result = render_body("[verse]\n____\n== Inside\n____\n\n== After\n\nSee <<After>>.");
    assert!(
        result
            .html
            .contains("<section class=\"sect1\" id=\"_after\">\n  <h2>After</h2>")
    );
    assert!(result.html.contains("<a href=\"#_after\">After</a>"));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_verse_keeps_footnotes() {
    let result = render_body("[verse]\n____\nA line footnote:[Aside].\n____");
    assert!(result.html.contains("<pre class=\"content\">A line <sup class=\"footnote\">"));
    assert!(result.html.contains("<a href=\"#_footnoteref_1\">1</a>. Aside"));
}

#[test]
fn test_stem_emits_mathjax_configuration() {
    let result = render("= Doc\n\nInline stem:[x^2].");
    let config = result.html.find("MathJax.Hub.Config").unwrap();
    let loader = result.html.find("MathJax.js?config=").unwrap();
    assert!(config < loader);
    assert!(result.html.contains(r#"asciimath2jax: { delimiters: [["\\$", "\\$"]]"#));
    assert!(result.html.contains(r#"inlineMath: [["\\(", "\\)"]]"#));
    assert!(result.html.contains("\\$x^2\\$"));
}

#[test]
fn test_skip_stem_js() {
    let result = render("= Doc\n:skip-stem-js:\n\nInline stem:[x^2].");
    assert!(!result.html.contains("MathJax"));
}

#[test]
fn test_document_shell_attributes() {
    let source = concat!(
        "= Doc\n",
        ":app-name: Manual\n",
        ":asciidoctor-css:\n",
        ":custom-css: <link rel=\"stylesheet\" href=\"site.css\">\n",
        ":body-classes: article toc2\n",
        ":header-html: <nav>menu</nav>\n",
        ":custom-js: <script src=\"a.js\"></script>, <script src=\"b.js\"></script>\n",
    );
    let html = render(source).html;

    assert!(html.contains(" <meta name=\"application-name\" content=\"Manual\">\n"));
    assert!(html.contains("asciidoctor.min.css"));
    assert!(html.contains("<link rel=\"stylesheet\" href=\"site.css\"></head>"));
    assert!(html.contains("<body class=\"article toc2\">\n<nav>menu</nav> <div id=\"content\">"));
    assert!(html.ends_with(concat!(
        " <script src=\"a.js\"></script>\n",
        " <script src=\"b.js\"></script>\n",
        "</body>\n</html>\n",
    )));
}

#[test]
fn test_hide_uri_scheme() {
    let result = render_body(":hide-uri-scheme:\n\nVisit https://example.org today.");
    assert!(
        result
            .html
            .contains("<a href=\"https://example.org\" class=\"bare\">example.org</a>")
    );

    let result = render_body("Visit https://example.org today.");
    assert!(result.html.contains(">https://example.org</a>"));
}

#[test]
fn test_nofollow_link() {
    let result = render_body("https://example.org[Example,window=_blank,opts=nofollow]");
    assert!(
        result
            .html
            .contains("target=\"_blank\" rel=\"nofollow noopener\">Example</a>")
    );
}
