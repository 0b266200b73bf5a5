//! Initialize a new site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Site
title: My Site
author: ''
description: ''
language: en
email: ''

# URL
url: http://example.com
root: /

# Directory
posts_dir: posts
pages_dir: pages
static_dir: static
public_dir: public

# Head
posts_title: ''
default_og_image: /images/default_og_image.png
favicon: /favicon.ico

# Header links
social:
  - name: github
    url: https://github.com/
    color: rgb(27, 204, 139)
nav:
  - name: posts
    path: /posts/

# Writing
new_post_name: :title.md

highlight:
  enable: true
  theme: base16-ocean.dark
  line_number: false

markdown:
  toc_heading: (table[ -]of[ -])?contents?|toc
  toc_tight: true
  math: true
  heading_anchors: true
  smart_punctuation: false
"#;

const LANDING_PAGE: &str = r#"---
description: A little bit about me
---

# Hi, I'm new here

This is the landing page. Edit `pages/index.md` to tell people about yourself.
"#;

/// Create the directory layout, a config file and sample content
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already contains a site", target_dir);
    }

    fs::create_dir_all(target_dir.join("posts"))?;
    fs::create_dir_all(target_dir.join("pages"))?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    fs::write(target_dir.join("pages/index.md"), LANDING_PAGE)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: The first post
completed: true
---

Welcome! This is your very first post.

## Table of contents

## Writing

Posts are markdown files in `posts/`. Only posts with `completed: true` show up
in the listing.

## Code

```rust
fn main() {{
    println!("Hello, world!");
}}
```

## Math

Inline math like $e^{{i\pi}} + 1 = 0$ and display math:

$$
\int_0^1 x^2 \, dx = \frac{{1}}{{3}}
$$
"#,
        now.format("%Y-%m-%d")
    );
    fs::write(target_dir.join("posts/hello-world.md"), sample_post)?;

    tracing::debug!("Wrote site skeleton to {:?}", target_dir);
    Ok(())
}
