//! Built-in site templates using the Tera template engine
//!
//! Templates and the stylesheet are embedded in the binary, so a site only
//! needs its markdown and static files.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::parse_date_string;
use crate::helpers::{html_escape, long_date, strip_html, truncate, MetaTag};

/// Stylesheet written to `css/style.css`
pub const STYLESHEET: &str = include_str!("site/style.css");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Rendered markdown is inserted as-is; text values use `| html_escape`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("page.html", include_str!("site/page.html")),
            ("posts.html", include_str!("site/posts.html")),
            ("post.html", include_str!("site/post.html")),
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/background.html",
                include_str!("site/partials/background.html"),
            ),
        ])?;

        tera.register_filter("html_escape", html_escape_filter);
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("long_date", long_date_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: escape text for element content and attribute values
fn html_escape_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("html_escape", "value", String, value);
    Ok(tera::Value::String(html_escape(&s)))
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(tera::Value::String(truncate(
        &collapsed,
        length,
        Some(&omission),
    )))
}

/// Tera filter: "2023-05-30" -> "May 30, 2023"; unparseable dates pass through
fn long_date_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("long_date", "value", String, value);
    let formatted = parse_date_string(&s)
        .map(|date| long_date(&date))
        .unwrap_or(s);
    Ok(tera::Value::String(formatted))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub home: String,
    pub favicon: String,
    pub stylesheet: String,
    pub mathjax_cdn: String,
    pub social: Vec<LinkData>,
    pub nav: Vec<LinkData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub name: String,
    pub href: String,
    pub color: String,
}

/// Layout-level values every page sets
#[derive(Debug, Clone, Serialize)]
pub struct PageHead {
    pub title: String,
    pub description: String,
    pub metas: Vec<MetaTag>,
    pub has_math: bool,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: String,
    pub title: String,
    pub href: String,
    /// `YYYY-MM-DD`, or the front-matter text when it is not a date
    pub date: String,
    pub description: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub name: String,
    pub title: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData {
            title: "Jane Doe".to_string(),
            description: "Personal site".to_string(),
            language: "en".to_string(),
            home: "/".to_string(),
            favicon: "/favicon.ico".to_string(),
            stylesheet: "/css/style.css".to_string(),
            mathjax_cdn: "https://cdn.example.com/mathjax.js".to_string(),
            social: vec![LinkData {
                name: "github".to_string(),
                href: "https://github.com/jane".to_string(),
                color: "rgb(27, 204, 139)".to_string(),
            }],
            nav: vec![LinkData {
                name: "posts".to_string(),
                href: "/posts/".to_string(),
                color: String::new(),
            }],
        }
    }

    fn head(has_math: bool) -> PageHead {
        PageHead {
            title: "A <Title>".to_string(),
            description: "<p>Some   description</p>".to_string(),
            metas: vec![MetaTag::new("og:title", "A \"quoted\" title")],
            has_math,
            path: "/".to_string(),
        }
    }

    #[test]
    fn test_layout_renders_head_and_header() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("head", &head(false));
        context.insert(
            "page",
            &PageData {
                name: "index".to_string(),
                title: "Jane Doe".to_string(),
                content: "<h1>About me</h1>".to_string(),
            },
        );

        let html = renderer.render("home.html", &context).unwrap();
        assert!(html.contains("<title>A &lt;Title&gt;</title>"));
        assert!(html.contains(r#"<meta name="description" content="Some description">"#));
        assert!(html.contains(r#"<meta property="og:title" content="A &quot;quoted&quot; title">"#));
        assert!(html.contains(r#"href="https://github.com/jane""#));
        assert!(html.contains(r#"<a href="/posts/">posts</a>"#));
        assert!(html.contains("<h1>About me</h1>"));
        assert!(!html.contains("mathjax.js"));
    }

    #[test]
    fn test_mathjax_only_when_needed() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("head", &head(true));
        context.insert(
            "post",
            &PostData {
                id: "p".to_string(),
                title: "P".to_string(),
                href: "/posts/p/".to_string(),
                date: "2023-05-30".to_string(),
                description: String::new(),
                content: "<p>x</p>".to_string(),
            },
        );

        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains(r#"src="https://cdn.example.com/mathjax.js""#));
        assert!(html.contains(r#"<h1 class="heading-xl" id="title">P</h1>"#));
        assert!(html.contains(r#"<time datetime="2023-05-30">May 30, 2023</time>"#));
    }

    #[test]
    fn test_posts_listing() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("head", &head(false));
        context.insert(
            "posts",
            &vec![PostData {
                id: "first".to_string(),
                title: "First & Best".to_string(),
                href: "/posts/first/".to_string(),
                date: "sometime".to_string(),
                description: "Hello".to_string(),
                content: String::new(),
            }],
        );

        let html = renderer.render("posts.html", &context).unwrap();
        assert!(html.contains(r#"<a href="/posts/first/">First &amp; Best</a>"#));
        assert!(html.contains("<span>Hello</span>"));
        assert!(html.contains(">sometime</time>"));
    }

    #[test]
    fn test_filters() {
        let args = HashMap::new();
        let value = tera::Value::String("2024-01-05".to_string());
        assert_eq!(
            long_date_filter(&value, &args).unwrap(),
            tera::Value::String("January 5, 2024".to_string())
        );

        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(8));
        let value = tera::Value::String("Hello   big world".to_string());
        assert_eq!(
            truncate_chars_filter(&value, &args).unwrap(),
            tera::Value::String("Hello...".to_string())
        );
    }
}
