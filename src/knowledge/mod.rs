//! Knowledge base access.
//!
//! A knowledge base is a directory of tagged Markdown documents plus an
//! index manifest listing them:
//! - index parsing (manifest table -> typed rows)
//! - document headers (title, tags, updated date)
//! - context selection for delegation
//! - health checks

mod audit;
mod document;
mod index;
mod selector;

pub use audit::*;
pub use document::*;
pub use index::*;
pub use selector::*;
