//! Knowledge base health checks.
//!
//! Reports index rows that would never be auto-selected or whose metadata
//! has drifted from the document they point at.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::document::DocumentHeader;
use super::index::IndexTable;
use super::selector::FileSelector;

/// Options for [`audit`].
#[derive(Debug, Clone, Copy)]
pub struct AuditOptions {
    /// Entries updated more than this many days before `today` are stale.
    pub stale_after_days: Option<i64>,
    /// Reference date for staleness.
    pub today: NaiveDate,
}

/// A problem found with one index row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "issue")]
pub enum Issue {
    /// The same path appears on an earlier row.
    DuplicatePath { first_line: usize },
    /// The path escapes the knowledge directory.
    OutsideKnowledgeDir,
    /// No regular file at the path.
    Missing,
    /// Too large to ever be auto-included.
    Oversized { size: u64, limit: u64 },
    /// The row has no tags, so it can only match nothing.
    Untagged,
    /// Not updated within the staleness window.
    Stale { updated: NaiveDate, age_days: i64 },
    /// The document's own `Tags:` header disagrees with the index.
    TagMismatch {
        index_only: Vec<String>,
        header_only: Vec<String>,
    },
}

/// An issue attached to the row it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub path: String,
    pub line: usize,
    #[serde(flatten)]
    pub issue: Issue,
}

/// Check every row of `table` against the files under the selector's
/// knowledge directory.
#[must_use]
pub fn audit(selector: &FileSelector, table: &IndexTable, options: &AuditOptions) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen: Vec<(&str, usize)> = Vec::new();
    let max_bytes = selector.limits().max_file_bytes;

    for entry in table {
        let mut report = |issue: Issue| {
            findings.push(Finding {
                path: entry.path.clone(),
                line: entry.line,
                issue,
            });
        };

        if let Some((_, first_line)) = seen.iter().find(|(p, _)| *p == entry.path) {
            report(Issue::DuplicatePath {
                first_line: *first_line,
            });
            continue;
        }
        seen.push((entry.path.as_str(), entry.line));

        if entry.tags.is_empty() {
            report(Issue::Untagged);
        }

        if let (Some(limit), Some(updated)) = (options.stale_after_days, entry.updated_at) {
            let age_days = (options.today - updated).num_days();
            if age_days > limit {
                report(Issue::Stale { updated, age_days });
            }
        }

        let Some(path) = selector.resolve(&entry.path) else {
            report(Issue::OutsideKnowledgeDir);
            continue;
        };

        let size = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                report(Issue::Missing);
                continue;
            }
        };
        if size >= max_bytes {
            report(Issue::Oversized {
                size,
                limit: max_bytes,
            });
        }

        match DocumentHeader::read(&path) {
            Ok(header) if !header.tags.is_empty() => {
                let index: HashSet<&String> = entry.tags.iter().collect();
                let doc: HashSet<&String> = header.tags.iter().collect();
                if index != doc {
                    let mut index_only: Vec<String> =
                        index.difference(&doc).map(|t| (*t).clone()).collect();
                    let mut header_only: Vec<String> =
                        doc.difference(&index).map(|t| (*t).clone()).collect();
                    index_only.sort();
                    header_only.sort();
                    report(Issue::TagMismatch {
                        index_only,
                        header_only,
                    });
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Could not read document header"),
        }
    }

    findings
}
