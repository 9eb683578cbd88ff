use std::collections::{HashMap, HashSet};

/// Turn heading text into an anchor-friendly slug.
///
/// Letters and digits are lowercased and kept (including non-ASCII ones),
/// everything else collapses into single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c == '\'' || c == '\u{2019}' {
            // "Don't" -> "dont"
            continue;
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Issues heading anchor ids that are unique within one render pass.
#[derive(Debug, Default)]
pub struct HeadingIds {
    issued: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for a heading with the given text.
    ///
    /// The first heading gets the bare slug; later collisions get `-1`,
    /// `-2`, ... skipping any candidate already issued, so two calls never
    /// return the same id.
    pub fn issue(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }

        if self.issued.insert(base.clone()) {
            return base;
        }

        let counter = self.counters.entry(base.clone()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}-{}", base, counter);
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
