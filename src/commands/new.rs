//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Create a post from the default front-matter scaffold
///
/// The file name comes from `new_post_name` unless `path` is given. New posts
/// start out unfinished so they stay out of the listing until published.
pub fn create_post(site: &Site, title: &str, path: Option<&str>) -> Result<PathBuf> {
    let now = chrono::Local::now();

    fs::create_dir_all(&site.posts_dir)?;

    let filename = match path {
        Some(p) => format!("{}.md", p.trim_end_matches(".md")),
        None => {
            let slug = slug::slugify(title);
            if slug.is_empty() {
                anyhow::bail!("Cannot derive a file name from title {:?}", title);
            }

            site.config
                .new_post_name
                .replace(":title", &slug)
                .replace(":year", &now.format("%Y").to_string())
                .replace(":month", &now.format("%m").to_string())
                .replace(":day", &now.format("%d").to_string())
        }
    };

    let file_path = site.posts_dir.join(&filename);
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let content = format!(
        "---\ntitle: {}\ndate: {}\ndescription: ''\ncompleted: false\n---\n",
        serde_yaml::to_string(title)?.trim_end(),
        now.format("%Y-%m-%d")
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
