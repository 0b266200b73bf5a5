//! Content loader - reads posts and pages from disk and renders them

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ContentError, FrontMatter, MarkdownRenderer, Page, Post, PostSummary};
use crate::Site;

/// Loads content from the posts and pages directories
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self, ContentError> {
        let renderer =
            MarkdownRenderer::with_options(&site.config.highlight, &site.config.markdown)?;
        Ok(Self { site, renderer })
    }

    /// Ids of every post, completed or not, sorted by id
    pub fn post_ids(&self) -> Result<Vec<String>, ContentError> {
        let mut ids: Vec<String> = markdown_files(&self.site.posts_dir)?
            .iter()
            .filter_map(|path| file_id(path))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Completed posts, newest first
    pub fn sorted_posts(&self) -> Result<Vec<PostSummary>, ContentError> {
        let mut posts = Vec::new();

        for id in self.post_ids()? {
            match self.read_summary(&id) {
                Ok(summary) if summary.completed => posts.push(summary),
                Ok(_) => tracing::debug!("Skipping unfinished post: {}", id),
                Err(e) => tracing::warn!("Failed to read post {}: {}", id, e),
            }
        }

        sort_by_date(&mut posts);
        Ok(posts)
    }

    /// Every post's metadata, including unfinished ones, newest first
    pub fn all_summaries(&self) -> Result<Vec<PostSummary>, ContentError> {
        let mut posts = Vec::new();
        for id in self.post_ids()? {
            match self.read_summary(&id) {
                Ok(summary) => posts.push(summary),
                Err(e) => tracing::warn!("Failed to read post {}: {}", id, e),
            }
        }
        sort_by_date(&mut posts);
        Ok(posts)
    }

    /// Read and render a single post
    pub fn load_post(&self, id: &str) -> Result<Post, ContentError> {
        let path = self.post_path(id);
        let content = read_post_file(id, &path)?;
        let (fm, body) = FrontMatter::parse(&content)?;
        let rendered = self.renderer.render_document(body)?;

        let date = fm.parse_date();
        if fm.date.is_some() && date.is_none() {
            tracing::warn!("Unrecognized date in post {}: {:?}", id, fm.date);
        }

        let mut post = Post::new(id.to_string(), path);
        if let Some(title) = fm.title {
            post.title = title;
        }
        post.date = date;
        post.date_raw = fm.date;
        post.description = fm.description;
        post.preview_image = fm.preview_image;
        post.completed = fm.completed;
        post.raw = body.to_string();
        post.content = rendered.html;
        post.has_math = rendered.has_math;
        post.headings = rendered.headings;
        post.extra = fm.extra;

        Ok(post)
    }

    /// Read and render every post
    pub fn load_posts(&self) -> Result<Vec<Post>, ContentError> {
        self.post_ids()?
            .iter()
            .map(|id| self.load_post(id))
            .collect()
    }

    /// Load all standalone pages
    pub fn load_pages(&self) -> Result<Vec<Page>, ContentError> {
        let mut pages = Vec::new();

        for path in markdown_files(&self.site.pages_dir)? {
            let Some(name) = file_id(&path) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            let (fm, body) = FrontMatter::parse(&content)?;
            let rendered = self.renderer.render_document(body)?;

            let mut page = Page::new(name, path);
            page.title = fm.title;
            page.description = fm.description;
            page.raw = body.to_string();
            page.content = rendered.html;
            page.has_math = rendered.has_math;
            page.extra = fm.extra;
            pages.push(page);
        }

        pages.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(pages)
    }

    /// Source file for a post id
    pub fn post_path(&self, id: &str) -> PathBuf {
        self.site.posts_dir.join(format!("{}.md", id))
    }

    /// Front-matter only; the body is not rendered
    fn read_summary(&self, id: &str) -> Result<PostSummary, ContentError> {
        let path = self.post_path(id);
        let content = read_post_file(id, &path)?;
        let (fm, _) = FrontMatter::parse(&content)?;

        Ok(PostSummary {
            id: id.to_string(),
            title: fm.title.clone().unwrap_or_else(|| id.to_string()),
            date: fm.parse_date(),
            date_raw: fm.date,
            description: fm.description,
            completed: fm.completed,
        })
    }
}

/// Newest first. Undated posts go last; ties break by id.
pub fn sort_by_date(posts: &mut [PostSummary]) {
    posts.sort_by(|a, b| {
        match (a.date, b.date) {
            (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.id.cmp(&b.id))
    });
}

fn read_post_file(id: &str, path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ContentError::PostNotFound {
            id: id.to_string(),
            path: path.to_path_buf(),
        },
        _ => ContentError::Io(e),
    })
}

/// Markdown files directly inside `dir`; a missing directory has none
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_markdown_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md")
        .unwrap_or(false)
}

fn file_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn site_in(dir: &Path) -> Site {
        Site::with_config(dir, SiteConfig::default())
    }

    #[test]
    fn test_post_ids_include_unfinished() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        write(&posts, "b-post.md", "---\ncompleted: true\n---\nB");
        write(&posts, "a-post.md", "---\ncompleted: false\n---\nA");
        write(&posts, "notes.txt", "ignored");

        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        assert_eq!(loader.post_ids().unwrap(), vec!["a-post", "b-post"]);
    }

    #[test]
    fn test_sorted_posts_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        write(&posts, "old.md", "---\ntitle: Old\ndate: 2021-01-01\ncompleted: true\n---\n");
        write(&posts, "new.md", "---\ntitle: New\ndate: 2023-06-15\ncompleted: true\n---\n");
        write(&posts, "draft.md", "---\ntitle: Draft\ndate: 2024-01-01\n---\n");
        write(&posts, "undated.md", "---\ntitle: Undated\ncompleted: true\n---\n");

        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        let ids: Vec<_> = loader
            .sorted_posts()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);

        let all = loader.all_summaries().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, "draft");
    }

    #[test]
    fn test_equal_dates_break_ties_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        write(&posts, "beta.md", "---\ndate: 2023-01-01\ncompleted: true\n---\n");
        write(&posts, "alpha.md", "---\ndate: 2023-01-01\ncompleted: true\n---\n");
        write(&posts, "newest.md", "---\ndate: 2023-02-01\ncompleted: true\n---\n");
        write(&posts, "zeta.md", "---\ncompleted: true\n---\n");
        write(&posts, "eta.md", "---\ndate: not a date\ncompleted: true\n---\n");

        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        let ids: Vec<_> = loader
            .sorted_posts()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["newest", "alpha", "beta", "eta", "zeta"]);
    }

    #[test]
    fn test_sorted_posts_skips_broken_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        write(&posts, "good.md", "---\ncompleted: true\n---\n");
        write(&posts, "bad.md", "---\ntitle: [oops\n---\n");

        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        let posts = loader.sorted_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "good");
    }

    #[test]
    fn test_load_post() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("posts"),
            "hello.md",
            "---\ntitle: Hello\ndate: 2024-02-03\ndescription: Greetings\ncompleted: true\n---\n\n## Intro\n\nSome $x$ math.\n",
        );

        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        let post = loader.load_post("hello").unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.date_raw.as_deref(), Some("2024-02-03"));
        assert_eq!(post.description.as_deref(), Some("Greetings"));
        assert!(post.content.contains(r#"<h2 id="intro">"#));
        assert!(post.has_math);
        assert_eq!(post.headings.len(), 1);
    }

    #[test]
    fn test_load_missing_post() {
        let dir = tempfile::tempdir().unwrap();
        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        assert!(matches!(
            loader.load_post("nope"),
            Err(ContentError::PostNotFound { .. })
        ));
        assert!(loader.post_ids().unwrap().is_empty());
    }

    #[test]
    fn test_load_pages() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        write(&pages, "index.md", "# About me\n\nHi!");
        write(&pages, "projects.md", "---\ntitle: Projects\n---\nStuff");

        let site = site_in(dir.path());
        let loader = ContentLoader::new(&site).unwrap();
        let pages = loader.load_pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_home());
        assert!(pages[0].content.contains("About me"));
        assert_eq!(pages[1].path, "/projects/");
        assert_eq!(pages[1].title.as_deref(), Some("Projects"));
    }
}
