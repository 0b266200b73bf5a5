//! Content module - handles posts, pages, and the markdown pipeline

mod error;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
pub mod slugger;

pub use error::ContentError;
pub use frontmatter::{parse_date_string, FrontMatter};
pub use markdown::{Heading, MarkdownRenderer, Rendered};
pub use post::{Page, Post, PostSummary};
