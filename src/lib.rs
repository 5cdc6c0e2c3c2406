//! Normalizes and sanitizes HTML documents against a fixed whitelist policy.
//!
//! A document goes through six stages, always in this order:
//!
//! 1. anchor ids are promoted onto the anchor's parent,
//! 2. empty and disallowed elements, disallowed attributes and URLs are removed,
//! 3. elements referenced by in-page links are moved before the next `<h1>`,
//! 4. nested tables are collapsed into a single warning cell,
//! 5. tables get a `<thead>`/`<tbody>` shape,
//! 6. paragraphs inside table cells are unwrapped.
//!
//! ```
//! let output = docsan::clean("<a href=\"git://x\">t</a>").unwrap();
//! assert_eq!(output, "<a>t</a>");
//! ```
#![warn(clippy::all)]
#[macro_use]
extern crate html5ever;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate maplit;

use std::path::Path;

pub mod anchors;
pub mod arena_dom;
pub mod config;
pub mod document;
pub mod elements;
pub mod error;
pub mod references;
pub mod sanitizer;
pub mod tables;

#[cfg(test)]
mod test_utils;

pub use anchors::sanitize_anchors;
pub use config::default::DEFAULT_CONFIG;
pub use document::Document;
pub use elements::sanitize_elements;
pub use error::{Error, Result};
pub use references::relocate_references;
pub use sanitizer::{Sanitizer, SanitizerConfig, Stage};
pub use tables::{eliminate_nested_tables, flatten_table_cells, normalize_tables};

/// Runs the whole pipeline over `input` with the default policy.
pub fn clean(input: &str) -> Result<String> {
    Sanitizer::default().clean(input)
}

/// Reads `path` and cleans it with the default policy.
pub fn clean_file(path: impl AsRef<Path>) -> Result<String> {
    Sanitizer::default().clean_file(path)
}
