//! Domain models for the curriculum site.
//!
//! # Core Concepts
//!
//! - [`Topic`]: a curriculum module with theory, references, animations and practice.
//! - [`Resource`]: an external reading/watching recommendation.
//! - [`Page`]: a standalone content page (about, glossary, ...).
//! - [`ContentBundle`]: the import format carrying all three.
//!
//! Content is authored in a CMS; the site validates and renders it but never
//! edits it beyond importing.

mod bundle;
mod page;
mod resource;
mod topic;

pub use bundle::*;
pub use page::*;
pub use resource::*;
pub use topic::*;

/// Whether `slug` is lowercase ASCII words joined by single dashes.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}
