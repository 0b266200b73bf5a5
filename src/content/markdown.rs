//! Markdown rendering pipeline
//!
//! Markdown goes through a fixed chain of passes before it is serialized:
//! GFM parsing, table of contents insertion, code highlighting, math
//! markup, heading ids and heading anchors. Raw HTML in the source is
//! passed through untouched.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::slugger::Slugger;
use super::ContentError;
use crate::config::{HighlightConfig, MarkdownConfig};
use crate::helpers::html_escape;

/// A heading found while rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Output of a full pipeline run
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    /// Whether the page needs MathJax
    pub has_math: bool,
    pub headings: Vec<Heading>,
}

/// Markdown renderer with TOC, highlighting, math and heading anchors
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    highlight: HighlightConfig,
    toc_heading: Option<Regex>,
    toc_tight: bool,
    math: bool,
    heading_anchors: bool,
    smart_punctuation: bool,
}

impl MarkdownRenderer {
    /// Create a renderer with default settings
    pub fn new() -> Self {
        let markdown = MarkdownConfig::default();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            highlight: HighlightConfig::default(),
            toc_heading: toc_regex(&markdown.toc_heading).ok(),
            toc_tight: markdown.toc_tight,
            math: markdown.math,
            heading_anchors: markdown.heading_anchors,
            smart_punctuation: markdown.smart_punctuation,
        }
    }

    /// Create with site settings
    pub fn with_options(
        highlight: &HighlightConfig,
        markdown: &MarkdownConfig,
    ) -> Result<Self, ContentError> {
        let toc_heading = if markdown.toc_heading.trim().is_empty() {
            None
        } else {
            Some(toc_regex(&markdown.toc_heading)?)
        };

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            highlight: highlight.clone(),
            toc_heading,
            toc_tight: markdown.toc_tight,
            math: markdown.math,
            heading_anchors: markdown.heading_anchors,
            smart_punctuation: markdown.smart_punctuation,
        })
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String, ContentError> {
        Ok(self.render_document(markdown)?.html)
    }

    /// Render markdown, keeping the heading list and math flag
    pub fn render_document(&self, markdown: &str) -> Result<Rendered, ContentError> {
        // Front-matter is stripped by FrontMatter::parse, so no metadata blocks here
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        if self.math {
            options |= Options::ENABLE_MATH;
        }
        if self.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut spans: Vec<HeadingSpan> = Vec::new();
        let mut open_heading: Option<HeadingSpan> = None;
        let mut code_block: Option<(Option<String>, String)> = None;
        let mut has_math = false;
        // Open block containers; headings inside them are not top-level
        let mut containers: Vec<TagEnd> = Vec::new();

        for event in parser {
            if let Some((_, code)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => code.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, code)) = code_block.take() {
                            let html = self.highlight_code(&code, lang.as_deref());
                            events.push(Event::Html(CowStr::from(html)));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match &event {
                Event::Start(
                    tag @ (Tag::BlockQuote(_)
                    | Tag::List(_)
                    | Tag::Item
                    | Tag::FootnoteDefinition(_)),
                ) => containers.push(tag.to_end()),
                Event::End(end) if containers.last() == Some(end) => {
                    containers.pop();
                }
                _ => {}
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::Start(Tag::Heading { level, ref id, .. }) => {
                    open_heading = Some(HeadingSpan {
                        start: events.len(),
                        end: 0,
                        level,
                        depth: containers.len(),
                        explicit_id: id.as_ref().map(|id| id.to_string()),
                        text: String::new(),
                    });
                    events.push(event);
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(mut span) = open_heading.take() {
                        span.end = events.len();
                        spans.push(span);
                    }
                    events.push(event);
                }
                Event::Text(ref text) | Event::Code(ref text) => {
                    if let Some(span) = open_heading.as_mut() {
                        span.text.push_str(text);
                    }
                    events.push(event);
                }
                Event::InlineMath(src) => {
                    has_math = true;
                    if let Some(span) = open_heading.as_mut() {
                        span.text.push_str(&src);
                    }
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math math-inline">\({}\)</span>"#,
                        html_escape(&src)
                    ))));
                }
                Event::DisplayMath(src) => {
                    has_math = true;
                    events.push(Event::InlineHtml(CowStr::from(format!(
                        r#"<span class="math math-display">\[{}\]</span>"#,
                        html_escape(&src)
                    ))));
                }
                _ => events.push(event),
            }
        }

        // Ids are assigned in document order so duplicates get stable suffixes
        let mut slugger = Slugger::new();
        let headings: Vec<Heading> = spans
            .iter()
            .map(|span| Heading {
                level: span.level as u8,
                id: span
                    .explicit_id
                    .clone()
                    .unwrap_or_else(|| slugger.slug(span.text.trim())),
                text: span.text.trim().to_string(),
            })
            .collect();

        let toc = self.toc_section(&spans, &headings);
        let by_start: HashMap<usize, &Heading> = spans
            .iter()
            .map(|span| span.start)
            .zip(headings.iter())
            .collect();

        let mut output: Vec<Event> = Vec::with_capacity(events.len() + headings.len() * 2 + 1);
        let mut current: Option<&Heading> = None;

        for (i, event) in events.into_iter().enumerate() {
            if let Some(toc) = &toc {
                if i == toc.insert_at {
                    output.push(Event::Html(CowStr::from(toc.html.clone())));
                }
                if (toc.insert_at..toc.resume_at).contains(&i) {
                    continue;
                }
            }

            match event {
                Event::Start(Tag::Heading {
                    level,
                    classes,
                    attrs,
                    ..
                }) => {
                    let heading = by_start.get(&i).copied();
                    let id = heading.map(|h| CowStr::from(h.id.clone()));
                    output.push(Event::Start(Tag::Heading {
                        level,
                        id,
                        classes,
                        attrs,
                    }));
                    if let (true, Some(heading)) = (self.heading_anchors, heading) {
                        output.push(Event::InlineHtml(CowStr::from(format!(
                            r##"<a href="#{}">"##,
                            html_escape(&heading.id)
                        ))));
                    }
                    current = heading;
                }
                Event::End(TagEnd::Heading(level)) => {
                    if self.heading_anchors && current.take().is_some() {
                        output.push(Event::InlineHtml(CowStr::from("</a>")));
                    }
                    output.push(Event::End(TagEnd::Heading(level)));
                }
                other => output.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, output.into_iter());

        // Headings inside the replaced TOC section are gone from the page
        let headings = spans
            .iter()
            .zip(headings)
            .filter(|(span, _)| {
                toc.as_ref()
                    .map_or(true, |toc| !(toc.insert_at..toc.resume_at).contains(&span.start))
            })
            .map(|(_, heading)| heading)
            .collect();

        Ok(Rendered {
            html: html_output,
            has_math,
            headings,
        })
    }

    /// Locate the TOC heading and build the list that replaces its section.
    ///
    /// The section runs from the TOC heading to the next heading of the same
    /// or higher rank; listed entries are that closing heading and everything
    /// after it. Without a closing heading there is no TOC. Only top-level
    /// headings take part, so the replaced range never splits a blockquote
    /// or list.
    fn toc_section(&self, spans: &[HeadingSpan], headings: &[Heading]) -> Option<TocSection> {
        let pattern = self.toc_heading.as_ref()?;
        let top_level = |i: &usize| spans[*i].depth == 0;

        let opening = (0..headings.len())
            .filter(top_level)
            .find(|&i| pattern.is_match(&headings[i].text))?;
        let opening_level = headings[opening].level;

        let closing = (opening + 1..headings.len())
            .filter(top_level)
            .find(|&i| headings[i].level <= opening_level)?;

        let entries: Vec<&Heading> = (closing..headings.len())
            .filter(top_level)
            .map(|i| &headings[i])
            .filter(|h| !h.text.is_empty())
            .collect();

        Some(TocSection {
            insert_at: spans[opening].end + 1,
            resume_at: spans[closing].start,
            html: toc_list(&entries, self.toc_tight),
        })
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        if !self.highlight.enable {
            return plain_code_block(code, lang);
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self
            .theme_set
            .themes
            .get(&self.highlight.theme)
            .or_else(|| self.theme_set.themes.values().next())
        else {
            return plain_code_block(code, lang);
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let highlighted = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|regions| styled_line_to_highlighted_html(&regions[..], IncludeBackground::No));
            match highlighted {
                Ok(html) => lines.push(html.replace(['\n', '\r'], "")),
                Err(e) => {
                    tracing::debug!("Highlighting failed for {}: {}", lang, e);
                    return plain_code_block(code, lang);
                }
            }
        }

        let style = background_style(theme);
        if self.highlight.line_number {
            add_line_numbers(&lines, lang, &style)
        } else {
            format!(
                r#"<pre class="language-{lang}"{style}><code class="language-{lang}">{}</code></pre>"#,
                lines.join("\n")
            )
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Event range of one heading, before ids are assigned
struct HeadingSpan {
    start: usize,
    end: usize,
    level: HeadingLevel,
    /// Number of enclosing blockquotes, lists and footnotes
    depth: usize,
    explicit_id: Option<String>,
    text: String,
}

/// Where the generated TOC goes and which events it replaces
struct TocSection {
    insert_at: usize,
    resume_at: usize,
    html: String,
}

fn toc_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i)^(?:{})$", pattern))
}

/// Nested list of heading links; nesting is relative to the shallowest entry
fn toc_list(entries: &[&Heading], tight: bool) -> String {
    let Some(base) = entries.iter().map(|h| h.level).min() else {
        return String::new();
    };

    let mut html = String::from("<ul>");
    let mut depth = base;
    let mut item_open = false;

    for heading in entries {
        if heading.level > depth {
            while depth < heading.level {
                if !item_open {
                    html.push_str("<li>");
                }
                html.push_str("<ul>");
                depth += 1;
                item_open = false;
            }
        } else {
            if item_open {
                html.push_str("</li>");
            }
            while depth > heading.level {
                html.push_str("</ul></li>");
                depth -= 1;
            }
        }

        let link = format!(
            r##"<a href="#{}">{}</a>"##,
            html_escape(&heading.id),
            html_escape(&heading.text)
        );
        if tight {
            html.push_str(&format!("<li>{}", link));
        } else {
            html.push_str(&format!("<li><p>{}</p>", link));
        }
        item_open = true;
    }

    if item_open {
        html.push_str("</li>");
    }
    while depth > base {
        html.push_str("</ul></li>");
        depth -= 1;
    }
    html.push_str("</ul>\n");
    html
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre class="language-{lang}"><code class="language-{lang}">{}</code></pre>"#,
        html_escape(code)
    )
}

fn background_style(theme: &Theme) -> String {
    theme
        .settings
        .background
        .map(|c| format!(r#" style="background-color:#{:02x}{:02x}{:02x};""#, c.r, c.g, c.b))
        .unwrap_or_default()
}

/// Add line numbers to highlighted code
fn add_line_numbers(lines: &[String], lang: &str, style: &str) -> String {
    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight language-{lang}"{style}><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre><code class="language-{lang}">{}</code></pre></td></tr></table></figure>"#,
        gutter,
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.").unwrap();
        assert!(html.contains(r##"<h1 id="hello-world"><a href="#hello-world">Hello World</a></h1>"##));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_heading_anchors_disabled() {
        let markdown = MarkdownConfig {
            heading_anchors: false,
            ..Default::default()
        };
        let renderer =
            MarkdownRenderer::with_options(&HighlightConfig::default(), &markdown).unwrap();
        let html = renderer.render("## Plain").unwrap();
        assert!(html.contains(r#"<h2 id="plain">Plain</h2>"#));
    }

    #[test]
    fn test_duplicate_and_explicit_ids() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render_document("## Setup\n\n## Setup\n\n## Custom {#mine}\n")
            .unwrap();
        let ids: Vec<_> = doc.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1", "mine"]);
        assert!(doc.html.contains(r#"id="mine""#));
    }

    #[test]
    fn test_gfm_table_and_strikethrough() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~")
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("<div class=\"note\">kept</div>\n\nText with <kbd>Ctrl</kbd>.")
            .unwrap();
        assert!(html.contains(r#"<div class="note">kept</div>"#));
        assert!(html.contains("<kbd>Ctrl</kbd>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains(r#"<pre class="language-rust""#));
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("<span"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_code_block_without_highlighting() {
        let highlight = HighlightConfig {
            enable: false,
            ..Default::default()
        };
        let renderer =
            MarkdownRenderer::with_options(&highlight, &MarkdownConfig::default()).unwrap();
        let html = renderer.render("```\na < b\n```").unwrap();
        assert!(html.contains(r#"<code class="language-text">a &lt; b"#));
    }

    #[test]
    fn test_line_numbers() {
        let highlight = HighlightConfig {
            line_number: true,
            ..Default::default()
        };
        let renderer =
            MarkdownRenderer::with_options(&highlight, &MarkdownConfig::default()).unwrap();
        let html = renderer.render("```python\na = 1\nb = 2\n```").unwrap();
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(!html.contains(r#"<span class="line-number">3</span>"#));
    }

    #[test]
    fn test_math() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer
            .render_document("Euler: $e^{i\\pi} + 1 = 0$\n\n$$\na < b\n$$\n")
            .unwrap();
        assert!(doc.has_math);
        assert!(doc
            .html
            .contains(r#"<span class="math math-inline">\(e^{i\pi} + 1 = 0\)</span>"#));
        assert!(doc.html.contains(r#"<span class="math math-display">\["#));
        assert!(doc.html.contains("a &lt; b"));

        let plain = renderer.render_document("No math here.").unwrap();
        assert!(!plain.has_math);
    }

    #[test]
    fn test_math_disabled() {
        let markdown = MarkdownConfig {
            math: false,
            ..Default::default()
        };
        let renderer =
            MarkdownRenderer::with_options(&HighlightConfig::default(), &markdown).unwrap();
        let doc = renderer.render_document("costs $5 and $6").unwrap();
        assert!(!doc.has_math);
        assert!(doc.html.contains("costs $5 and $6"));
    }

    #[test]
    fn test_table_of_contents() {
        let renderer = MarkdownRenderer::new();
        let markdown = "# Title\n\n## Table of Contents\n\nplaceholder text\n\n## Intro\n\n### Details\n\n## Outro\n";
        let html = renderer.render(markdown).unwrap();

        assert!(!html.contains("placeholder text"));
        assert!(html.contains(
            r##"<ul><li><a href="#intro">Intro</a><ul><li><a href="#details">Details</a></li></ul></li><li><a href="#outro">Outro</a></li></ul>"##
        ));
        // The list sits between the TOC heading and the first listed heading
        let toc_pos = html.find(r#"id="table-of-contents""#).unwrap();
        let list_pos = html.find("<ul>").unwrap();
        let intro_pos = html.find(r#"<h2 id="intro">"#).unwrap();
        assert!(toc_pos < list_pos && list_pos < intro_pos);
    }

    #[test]
    fn test_toc_needs_closing_heading() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Contents\n\n### Only child\n").unwrap();
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn test_toc_loose_list() {
        let markdown = MarkdownConfig {
            toc_tight: false,
            ..Default::default()
        };
        let renderer =
            MarkdownRenderer::with_options(&HighlightConfig::default(), &markdown).unwrap();
        let html = renderer.render("## TOC\n\n## Next\n").unwrap();
        assert!(html.contains(r##"<li><p><a href="#next">Next</a></p></li>"##));
    }

    #[test]
    fn test_toc_heading_in_blockquote_is_ignored() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("> ## Contents\n\n## Next\n").unwrap();

        assert!(!html.contains("<ul>"));
        assert_eq!(html.matches("<blockquote>").count(), 1);
        assert_eq!(html.matches("</blockquote>").count(), 1);
        assert!(html.contains(r#"<h2 id="next">"#));
    }

    #[test]
    fn test_nested_heading_does_not_close_toc() {
        let renderer = MarkdownRenderer::new();
        let markdown = "## Contents\n\n- item\n\n  ## Nested\n\n## Next\n\n> ### Quoted\n\n### Child\n";
        let rendered = renderer.render_document(markdown).unwrap();
        let html = &rendered.html;

        // The list with the nested heading is replaced as a whole
        assert!(!html.contains("item"));
        assert!(!html.contains(r#"id="nested""#));
        assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
        assert_eq!(html.matches("<li>").count(), html.matches("</li>").count());
        assert!(html.contains(
            r##"<ul><li><a href="#next">Next</a><ul><li><a href="#child">Child</a></li></ul></li></ul>"##
        ));
        // Quoted headings are still rendered, just not listed
        assert!(html.contains(r#"<h3 id="quoted">"#));
        let ids: Vec<_> = rendered.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["contents", "next", "quoted", "child"]);
    }

    #[test]
    fn test_footnotes_and_task_lists() {
        let renderer = MarkdownRenderer::new();
        let html = renderer
            .render("Claim[^1].\n\n- [x] done\n- [ ] todo\n\n[^1]: Source.\n")
            .unwrap();

        assert!(html.contains(r#"class="footnote-reference""#));
        assert!(html.contains(r##"href="#1""##));
        assert!(html.contains(r#"class="footnote-definition""#));
        assert!(html.contains(r#"<input disabled="" type="checkbox" checked=""/>"#));
        assert!(html.contains(r#"<input disabled="" type="checkbox"/>"#));
    }

    #[test]
    fn test_invalid_toc_pattern() {
        let markdown = MarkdownConfig {
            toc_heading: "(".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            MarkdownRenderer::with_options(&HighlightConfig::default(), &markdown),
            Err(ContentError::TocPattern(_))
        ));
    }
}
