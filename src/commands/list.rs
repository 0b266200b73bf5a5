//! List site content

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::content::PostSummary;
use crate::Site;

/// Print the post listing; `all` includes unfinished posts
pub fn run(site: &Site, all: bool, json: bool) -> Result<()> {
    let loader = ContentLoader::new(site)?;

    let posts = if all {
        loader.all_summaries()?
    } else {
        loader.sorted_posts()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!("  {}", summary_line(post));
    }

    let pages = loader.load_pages()?;
    println!("Pages ({}):", pages.len());
    for page in pages {
        println!("  {} [{}]", page.path, page.source.display());
    }

    Ok(())
}

fn summary_line(post: &PostSummary) -> String {
    let date = post
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .or_else(|| post.date_raw.clone())
        .unwrap_or_else(|| "----------".to_string());
    let marker = if post.completed { "" } else { " (unfinished)" };
    format!("{} - {} [{}]{}", date, post.title, post.id, marker)
}
