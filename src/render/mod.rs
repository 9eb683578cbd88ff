//! Rich-text document rendering.
//!
//! Editor documents arrive as a tagged node tree ([`Document`]). A render
//! pass walks the tree once, producing HTML plus a table of contents whose
//! heading ids are unique within that pass.

mod document;
mod html;
mod outline;
mod slug;

pub use document::*;
pub use html::*;
pub use outline::*;
pub use slug::*;
