//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    pub email: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub posts_dir: String,
    pub pages_dir: String,
    pub static_dir: String,
    pub public_dir: String,

    // Pages
    pub posts_title: String,
    pub default_og_image: String,
    pub favicon: String,
    #[serde(default)]
    pub social: Vec<SocialLink>,
    #[serde(default)]
    pub nav: Vec<NavLink>,

    // Writing
    pub new_post_name: String,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    pub mathjax_cdn: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            author: String::new(),
            description: String::new(),
            language: "en".to_string(),
            email: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            posts_dir: "posts".to_string(),
            pages_dir: "pages".to_string(),
            static_dir: "static".to_string(),
            public_dir: "public".to_string(),

            posts_title: String::new(),
            default_og_image: "/images/default_og_image.png".to_string(),
            favicon: "/favicon.ico".to_string(),
            social: Vec::new(),
            nav: default_nav(),

            new_post_name: ":title.md".to_string(),
            highlight: HighlightConfig::default(),
            markdown: MarkdownConfig::default(),
            mathjax_cdn: "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js".to_string(),
        }
    }
}

fn default_nav() -> Vec<NavLink> {
    ["posts", "projects", "profile"]
        .into_iter()
        .map(|name| NavLink {
            name: name.to_string(),
            path: "/posts/".to_string(),
        })
        .collect()
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Title of the post listing page
    pub fn posts_title(&self) -> String {
        if self.posts_title.is_empty() {
            format!("Posts - {}", self.title)
        } else {
            self.posts_title.clone()
        }
    }
}

/// A social/contact link shown as an icon in the header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub color: String,
}

/// A header navigation entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavLink {
    pub name: String,
    pub path: String,
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Markdown pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Pattern a heading must match (whole text, case-insensitive) to receive the TOC
    pub toc_heading: String,
    pub toc_tight: bool,
    pub math: bool,
    pub heading_anchors: bool,
    pub smart_punctuation: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            toc_heading: "(table[ -]of[ -])?contents?|toc".to_string(),
            toc_tight: true,
            math: true,
            heading_anchors: true,
            smart_punctuation: false,
        }
    }
}
