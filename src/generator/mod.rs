//! Generator module - writes the static site using the built-in Tera templates

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;
use walkdir::WalkDir;

use crate::content::loader::ContentLoader;
use crate::content::{Page, Post, PostSummary};
use crate::helpers::{
    iso_date, page_metas, post_metas, post_path, site_link, url_for, with_default_image,
};
use crate::templates::{
    LinkData, PageData, PageHead, PostData, SiteData, TemplateRenderer, STYLESHEET,
};
use crate::Site;

/// Output path of the embedded stylesheet
const STYLESHEET_PATH: &str = "css/style.css";

/// Counts reported after a build
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerateStats {
    pub pages: usize,
    pub posts: usize,
    pub listed: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site
    pub fn generate(&self) -> Result<GenerateStats> {
        let loader = ContentLoader::new(&self.site)?;
        let pages = loader.load_pages()?;
        let posts = loader.load_posts()?;
        let listed = loader.sorted_posts()?;

        tracing::info!(
            "Loaded {} posts ({} listed) and {} pages",
            posts.len(),
            listed.len(),
            pages.len()
        );

        fs::create_dir_all(&self.site.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.site.public_dir))?;

        let assets = self.copy_static_assets()?;
        self.write_file(STYLESHEET_PATH, STYLESHEET)?;

        let site_data = self.build_site_data();

        let home = pages.iter().find(|p| p.is_home());
        self.generate_home(home, &site_data)?;

        for page in pages.iter().filter(|p| !p.is_home()) {
            self.generate_page(page, &site_data)?;
        }

        self.generate_post_list(&listed, &site_data)?;

        for post in &posts {
            self.generate_post(post, &site_data)?;
        }

        Ok(GenerateStats {
            pages: pages.len(),
            posts: posts.len(),
            listed: listed.len(),
            assets,
        })
    }

    /// Values shared by every template
    fn build_site_data(&self) -> SiteData {
        let config = &self.site.config;

        let social = config
            .social
            .iter()
            .map(|link| LinkData {
                name: link.name.clone(),
                href: site_link(config, &link.url),
                color: link.color.clone(),
            })
            .collect();

        let nav = config
            .nav
            .iter()
            .map(|link| LinkData {
                name: link.name.clone(),
                href: site_link(config, &link.path),
                color: String::new(),
            })
            .collect();

        SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            home: url_for(config, ""),
            favicon: url_for(config, &config.favicon),
            stylesheet: url_for(config, STYLESHEET_PATH),
            mathjax_cdn: config.mathjax_cdn.clone(),
            social,
            nav,
        }
    }

    fn base_context(&self, site_data: &SiteData, head: &PageHead) -> Context {
        let mut context = Context::new();
        context.insert("site", site_data);
        context.insert("head", head);
        context
    }

    /// Landing page from `pages/index.md`; empty when there is none
    fn generate_home(&self, page: Option<&Page>, site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;

        let (head, data) = match page {
            Some(page) => {
                let description = page
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| config.description.clone());
                let head = PageHead {
                    title: config.title.clone(),
                    description,
                    metas: with_default_image(config, page_metas(config, page)),
                    has_math: page.has_math,
                    path: page.path.clone(),
                };
                (head, page_data(page, &config.title))
            }
            None => {
                tracing::warn!("No index.md in {:?}, home page is empty", self.site.pages_dir);
                let head = PageHead {
                    title: config.title.clone(),
                    description: config.description.clone(),
                    metas: with_default_image(config, Vec::new()),
                    has_math: false,
                    path: "/".to_string(),
                };
                let data = PageData {
                    name: "index".to_string(),
                    title: config.title.clone(),
                    content: String::new(),
                };
                (head, data)
            }
        };

        let mut context = self.base_context(site_data, &head);
        context.insert("page", &data);

        let html = self.renderer.render("home.html", &context)?;
        self.write_file("index.html", &html)
    }

    /// Any other page under `/<name>/`
    fn generate_page(&self, page: &Page, site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;
        let title = page.title.clone().unwrap_or_else(|| page.name.clone());

        let head = PageHead {
            title: format!("{} - {}", title, config.title),
            description: page
                .description
                .clone()
                .unwrap_or_else(|| page.content.clone()),
            metas: with_default_image(config, page_metas(config, page)),
            has_math: page.has_math,
            path: page.path.clone(),
        };

        let mut context = self.base_context(site_data, &head);
        context.insert("page", &page_data(page, &title));

        let html = self.renderer.render("page.html", &context)?;
        self.write_file(&format!("{}/index.html", page.name), &html)
    }

    /// Completed posts, newest first
    fn generate_post_list(&self, posts: &[PostSummary], site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;

        let data: Vec<PostData> = posts
            .iter()
            .map(|post| PostData {
                id: post.id.clone(),
                title: post.title.clone(),
                href: url_for(config, &post_path(&post.id)),
                date: display_date(post.date.as_ref().map(iso_date), post.date_raw.as_deref()),
                description: post.description.clone().unwrap_or_default(),
                content: String::new(),
            })
            .collect();

        let head = PageHead {
            title: config.posts_title(),
            description: config.description.clone(),
            metas: with_default_image(config, Vec::new()),
            has_math: false,
            path: "/posts/".to_string(),
        };

        let mut context = self.base_context(site_data, &head);
        context.insert("posts", &data);

        let html = self.renderer.render("posts.html", &context)?;
        self.write_file("posts/index.html", &html)?;
        tracing::debug!("Listed {} posts", data.len());
        Ok(())
    }

    /// One post page; unfinished posts are generated too, just not listed
    fn generate_post(&self, post: &Post, site_data: &SiteData) -> Result<()> {
        let config = &self.site.config;
        let path = post_path(&post.id);

        let head = PageHead {
            title: post.title.clone(),
            description: post
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| post.content.clone()),
            metas: with_default_image(config, post_metas(config, post)),
            has_math: post.has_math,
            path: format!("/{}", path),
        };

        let data = PostData {
            id: post.id.clone(),
            title: post.title.clone(),
            href: url_for(config, &path),
            date: display_date(post.date.as_ref().map(iso_date), post.date_raw.as_deref()),
            description: post.description.clone().unwrap_or_default(),
            content: post.content.clone(),
        };

        let mut context = self.base_context(site_data, &head);
        context.insert("post", &data);

        let html = self.renderer.render("post.html", &context)?;
        self.write_file(&format!("posts/{}/index.html", post.id), &html)
    }

    /// Copy everything under the static directory into the output
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.site.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.site.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            copied += 1;
        }

        tracing::debug!("Copied {} static files", copied);
        Ok(copied)
    }

    /// Write `contents` to a path relative to the public directory
    fn write_file(&self, relative: &str, contents: &str) -> Result<()> {
        let output_path = output_path(&self.site.public_dir, relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, contents)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

fn page_data(page: &Page, title: &str) -> PageData {
    PageData {
        name: page.name.clone(),
        title: title.to_string(),
        content: page.content.clone(),
    }
}

/// Parsed date when there is one, otherwise the front-matter text
fn display_date(parsed: Option<String>, raw: Option<&str>) -> String {
    parsed.or_else(|| raw.map(str::to_string)).unwrap_or_default()
}

fn output_path(public_dir: &Path, relative: &str) -> PathBuf {
    public_dir.join(relative.trim_start_matches('/'))
}
