//! Knowledge document header parsing.
//!
//! Documents open with a title heading followed by a short metadata block:
//!
//! ```text
//! # Deploy runbook
//!
//! **Tags:** deploy, ops
//! **Updated:** 2026-01-12
//! ```
//!
//! A `---` front matter block with the same keys is also accepted. Only
//! the text before the second heading is considered.

use std::path::Path;

use chrono::NaiveDate;
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, Options};

use super::index::parse_tags;

/// Metadata read from the top of a knowledge document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Front matter `title:`, else the text of the first heading.
    pub title: Option<String>,
    /// Tags from a `Tags:` line.
    pub tags: Vec<String>,
    /// Date from an `Updated:` line.
    pub updated_at: Option<NaiveDate>,
}

impl DocumentHeader {
    /// Read and parse the header of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse a header from Markdown content.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let arena = Arena::new();
        let mut options = Options::default();
        options.extension.front_matter_delimiter = Some("---".to_string());
        let root = parse_document(&arena, content, &options);

        let mut header = Self::default();
        let mut headings = 0;

        for node in root.children() {
            if let NodeValue::FrontMatter(raw) = &node.data.borrow().value {
                for line in raw.lines() {
                    header.apply_metadata_line(line);
                }
                continue;
            }
            if matches!(node.data.borrow().value, NodeValue::Heading(_)) {
                headings += 1;
                if headings > 1 {
                    break;
                }
                let title = extract_text(node);
                if header.title.is_none() && !title.is_empty() {
                    header.title = Some(title);
                }
                continue;
            }

            let text = extract_text(node);
            for line in text.lines() {
                header.apply_metadata_line(line);
            }
        }

        header
    }

    fn apply_metadata_line(&mut self, line: &str) {
        let line = line.trim().trim_start_matches(['-', '*', ' ']);
        let Some((key, value)) = line.split_once(':') else {
            return;
        };

        match key.trim().to_lowercase().as_str() {
            "title" if self.title.is_none() && !value.trim().is_empty() => {
                self.title = Some(value.trim().trim_matches(['"', '\'']).to_string());
            }
            "tags" if self.tags.is_empty() => self.tags = parse_tags(value),
            "updated" | "last updated" if self.updated_at.is_none() => {
                self.updated_at = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok();
            }
            _ => {}
        }
    }
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text.trim().to_string()
}

/// Recursively collect text, keeping line structure.
fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => out.push_str(t),
        NodeValue::Code(c) => out.push_str(&c.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push('\n'),
        NodeValue::Item(_) | NodeValue::Paragraph => {
            for child in node.children() {
                collect_text(child, out);
            }
            out.push('\n');
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}
