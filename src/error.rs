//! Content validation errors shared by the store and the HTTP layer.

use thiserror::Error;

/// Errors raised when content fails local validation.
///
/// The store returns these wrapped in `anyhow::Error`; handlers downcast to
/// decide which failures are safe to show to clients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("Invalid slug '{0}': use lowercase letters, digits and single dashes")]
    InvalidSlug(String),

    #[error("Slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Resource URL must not be empty")]
    EmptyUrl,
}
