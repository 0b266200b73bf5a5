//! Errors raised while reading and rendering content

use std::path::PathBuf;
use thiserror::Error;

/// Content loading and rendering errors
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Post not found: {id} (looked for {path:?})")]
    PostNotFound { id: String, path: PathBuf },

    #[error("Invalid front-matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("Invalid TOC heading pattern: {0}")]
    TocPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
