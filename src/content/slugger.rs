//! GitHub-style heading anchors

use std::collections::HashMap;

/// Generates unique heading ids within one document
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `text`, suffixed with `-1`, `-2`, ... when already taken
    pub fn slug(&mut self, text: &str) -> String {
        let original = slugify(text);
        let mut slug = original.clone();

        while self.occurrences.contains_key(&slug) {
            let count = self.occurrences.entry(original.clone()).or_insert(0);
            *count += 1;
            slug = format!("{}-{}", original, count);
        }

        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

/// Lowercase, drop punctuation, spaces to hyphens. No deduplication.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '-' | '_' => Some(c),
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}
