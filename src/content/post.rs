//! Post and Page models

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

use super::markdown::Heading;

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// File name without `.md`; also the URL segment
    pub id: String,

    /// Post title (falls back to the id)
    pub title: String,

    /// Parsed publication date
    pub date: Option<NaiveDateTime>,

    /// Date exactly as written in the front-matter
    pub date_raw: Option<String>,

    pub description: Option<String>,

    /// Site-relative path of the Open Graph preview image
    pub preview_image: Option<String>,

    /// Whether the post shows up in the post listing
    pub completed: bool,

    /// Raw markdown content
    pub raw: String,

    /// Rendered HTML content
    pub content: String,

    /// Whether the content contains math
    pub has_math: bool,

    pub headings: Vec<Heading>,

    /// Full source file path
    pub source: PathBuf,

    /// Custom front-matter fields
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(id: String, source: PathBuf) -> Self {
        Self {
            title: id.clone(),
            id,
            date: None,
            date_raw: None,
            description: None,
            preview_image: None,
            completed: false,
            raw: String::new(),
            content: String::new(),
            has_math: false,
            headings: Vec::new(),
            source,
            extra: IndexMap::new(),
        }
    }
}

/// Metadata-only view of a post, used by listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub date_raw: Option<String>,
    pub description: Option<String>,
    pub completed: bool,
}

/// A standalone page
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// File name without `.md`
    pub name: String,

    pub title: Option<String>,

    pub description: Option<String>,

    /// Raw markdown content
    pub raw: String,

    /// Rendered HTML content
    pub content: String,

    pub has_math: bool,

    /// URL path (`/` for the landing page)
    pub path: String,

    /// Full source file path
    pub source: PathBuf,

    /// Custom front-matter fields
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Page {
    /// Create a new page with minimal required fields
    pub fn new(name: String, source: PathBuf) -> Self {
        let path = if name == "index" {
            "/".to_string()
        } else {
            format!("/{}/", name)
        };
        Self {
            name,
            title: None,
            description: None,
            raw: String::new(),
            content: String::new(),
            has_math: false,
            path,
            source,
            extra: IndexMap::new(),
        }
    }

    /// Whether this is the landing page
    pub fn is_home(&self) -> bool {
        self.path == "/"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_paths() {
        let home = Page::new("index".to_string(), PathBuf::from("pages/index.md"));
        assert_eq!(home.path, "/");
        assert!(home.is_home());

        let projects = Page::new("projects".to_string(), PathBuf::from("pages/projects.md"));
        assert_eq!(projects.path, "/projects/");
        assert!(!projects.is_home());
    }

    #[test]
    fn test_post_defaults() {
        let post = Post::new("graphs".to_string(), PathBuf::from("posts/graphs.md"));
        assert_eq!(post.title, "graphs");
        assert!(!post.completed);
    }
}
