//! Open Graph meta tags

use serde::Serialize;

use super::url::{full_url_for, is_absolute_url, post_path, url_for};
use crate::config::SiteConfig;
use crate::content::{Page, Post};

/// One `<meta property=… content=…>` element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaTag {
    pub property: String,
    pub content: String,
}

impl MetaTag {
    pub fn new(property: &str, content: impl Into<String>) -> Self {
        Self {
            property: property.to_string(),
            content: content.into(),
        }
    }
}

/// Article metadata for a post page
pub fn post_metas(config: &SiteConfig, post: &Post) -> Vec<MetaTag> {
    let mut metas = vec![
        MetaTag::new("og:url", full_url_for(config, &post_path(&post.id))),
        MetaTag::new("og:title", post.title.clone()),
        MetaTag::new("og:type", "article"),
    ];

    if let Some(description) = post.description.as_deref().filter(|d| !d.is_empty()) {
        metas.push(MetaTag::new("og:description", description));
    }

    if let Some(image) = post.preview_image.as_deref().filter(|i| !i.is_empty()) {
        metas.push(MetaTag::new("og:image", preview_image_url(config, image)));
    }

    metas
}

/// Preview images are addressed from the domain, without `root`
fn preview_image_url(config: &SiteConfig, image: &str) -> String {
    if is_absolute_url(image) {
        return image.to_string();
    }
    format!(
        "{}/{}",
        config.url.trim_end_matches('/'),
        image.trim_start_matches('/')
    )
}

/// Website metadata for a standalone page
pub fn page_metas(config: &SiteConfig, page: &Page) -> Vec<MetaTag> {
    let mut metas = vec![
        MetaTag::new("og:url", full_url_for(config, &page.path)),
        MetaTag::new("og:type", "website"),
    ];
    if let Some(title) = &page.title {
        metas.push(MetaTag::new("og:title", title.clone()));
    }
    if let Some(description) = page.description.as_deref().filter(|d| !d.is_empty()) {
        metas.push(MetaTag::new("og:description", description));
    }
    metas
}

/// Append the site's default `og:image` unless one is already present
pub fn with_default_image(config: &SiteConfig, mut metas: Vec<MetaTag>) -> Vec<MetaTag> {
    let has_image = metas.iter().any(|m| m.property == "og:image");
    if !has_image && !config.default_og_image.is_empty() {
        metas.push(MetaTag::new(
            "og:image",
            full_url_for(config, &config.default_og_image),
        ));
    }
    metas
}

/// Link target of a site-relative path, for templates
pub fn site_link(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("mailto:") {
        path.to_string()
    } else {
        url_for(config, path)
    }
}
