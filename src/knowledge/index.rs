//! Index manifest parser.
//!
//! The manifest is a Markdown table:
//!
//! ```text
//! | Topic | File | Tags | Updated |
//! |-------|------|------|---------|
//! | Deploy runbook | ops/deploy.md | deploy, ops | 2026-01-12 |
//! ```
//!
//! Parsing is lenient. Anything that is not a usable data row (prose,
//! header, separator, rows without a file) is skipped rather than rejected.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::tags::normalize_tag;

static SEPARATOR_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("separator pattern is valid"));

static LINK_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]*\]\(([^)\s]+)\)$").expect("link pattern is valid"));

/// One row of the index manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Human-readable label.
    pub topic: String,
    /// Path relative to the knowledge directory.
    pub path: String,
    /// Normalized tags, in first-seen order.
    pub tags: Vec<String>,
    /// Last update date, when the cell holds `YYYY-MM-DD`.
    pub updated_at: Option<NaiveDate>,
    /// 1-based line number in the manifest.
    pub line: usize,
}

impl IndexEntry {
    /// Tags of this entry that are also in `wanted`.
    #[must_use]
    pub fn matching_tags(&self, wanted: &crate::tags::TagSet) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| wanted.contains(t.as_str()))
            .cloned()
            .collect()
    }
}

/// Errors from loading the index manifest.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index manifest not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read index manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Column positions, taken from the header row when one is present.
#[derive(Debug, Clone, Copy)]
struct Columns {
    topic: usize,
    file: usize,
    tags: usize,
    updated: usize,
    count: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            topic: 0,
            file: 1,
            tags: 2,
            updated: 3,
            count: 4,
        }
    }
}

impl Columns {
    /// Recognize a header row. Requires at least a `File` column.
    fn from_header(cells: &[&str]) -> Option<Self> {
        let find = |names: &[&str]| {
            cells
                .iter()
                .position(|c| names.iter().any(|n| c.eq_ignore_ascii_case(n)))
        };

        let file = find(&["file", "path"])?;
        let defaults = Self::default();
        Some(Self {
            topic: find(&["topic", "title"]).unwrap_or(defaults.topic),
            file,
            tags: find(&["tags", "tag"]).unwrap_or(defaults.tags),
            updated: find(&["updated", "last updated", "date"]).unwrap_or(defaults.updated),
            count: cells.len(),
        })
    }
}

/// Ordered rows of the index manifest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexTable {
    entries: Vec<IndexEntry>,
}

impl IndexTable {
    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NotFound` when the file is absent, and
    /// `IndexError::Read` for any other I/O failure.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let table = Self::parse(&content);
                tracing::debug!(path = %path.display(), rows = table.len(), "Loaded index manifest");
                Ok(table)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(IndexError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(IndexError::Read {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Parse manifest text.
    ///
    /// A row is taken as a header only when it opens a table block or sits
    /// directly above a separator row, so data cells such as a `file` tag
    /// never reset the column layout.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let lines: Vec<&str> = content.lines().map(str::trim).collect();
        let mut columns = Columns::default();
        let mut entries = Vec::new();
        let mut block_rows = 0;

        for (idx, line) in lines.iter().enumerate() {
            if !line.contains('|') {
                block_rows = 0;
                continue;
            }
            block_rows += 1;

            let cells = split_row(line);
            if is_separator(&cells) {
                continue;
            }

            let opens_header = block_rows == 1
                || lines
                    .get(idx + 1)
                    .is_some_and(|next| next.contains('|') && is_separator(&split_row(next)));
            if opens_header {
                if let Some(header) = Columns::from_header(&cells) {
                    columns = header;
                    continue;
                }
            }

            match parse_row(&cells, columns, idx + 1) {
                Some(entry) => entries.push(entry),
                None => tracing::trace!(line = idx + 1, "Skipping malformed index row"),
            }
        }

        Self { entries }
    }

    /// All parsed rows, in manifest order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a IndexTable {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn is_separator(cells: &[&str]) -> bool {
    cells.iter().all(|c| c.is_empty() || SEPARATOR_CELL.is_match(c))
}

/// Split a table line into trimmed cells, dropping the outer pipes.
fn split_row(line: &str) -> Vec<&str> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

fn parse_row(cells: &[&str], columns: Columns, line: usize) -> Option<IndexEntry> {
    // Unescaped pipes inside the tags cell produce extra cells. Fold them
    // back into the tags column and shift the columns after it.
    let extra = cells.len().saturating_sub(columns.count);
    let shift = |col: usize| if col > columns.tags { col + extra } else { col };

    let path = clean_path(cells.get(shift(columns.file))?);
    if path.is_empty() {
        return None;
    }

    let tags_end = (columns.tags + extra + 1).min(cells.len());
    let tags = cells
        .get(columns.tags..tags_end)
        .map(|spread| parse_tags(&spread.join(",")))
        .unwrap_or_default();

    let topic = cells
        .get(shift(columns.topic))
        .map(|t| (*t).to_string())
        .unwrap_or_default();

    let updated_at = cells
        .get(shift(columns.updated))
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    Some(IndexEntry {
        topic,
        path,
        tags,
        updated_at,
        line,
    })
}

/// Strip code spans and Markdown links from a file cell.
fn clean_path(cell: &str) -> String {
    let cell = cell.trim().trim_matches('`').trim();
    match LINK_CELL.captures(cell) {
        Some(caps) => caps[1].trim_matches('`').to_string(),
        None => cell.to_string(),
    }
}

/// Tokenize a tag list. Commas, pipes, slashes, semicolons and whitespace
/// all separate tags; backticks, quotes, brackets and `#` are stripped.
#[must_use]
pub fn parse_tags(cell: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for token in cell.split(|c: char| matches!(c, ',' | '|' | '/' | ';') || c.is_whitespace()) {
        let token = token.trim_matches(|c: char| matches!(c, '`' | '#' | '"' | '\'' | '[' | ']'));
        if let Some(tag) = normalize_tag(token) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "# Knowledge Index

Curated by the orchestrator.

| Topic | File | Tags | Updated |
|-------|------|------|---------|
| Deploy runbook | ops/deploy.md | deploy, ops | 2026-01-12 |
| Code style | `style.md` | code | 2026-02-01 |
| Welcome | [welcome](onboarding.md) | onboarding | unknown |
| Broken |  | code | 2026-01-01 |
";

    #[test]
    fn test_parse_skips_prose_header_and_separator() {
        let table = IndexTable::parse(INDEX);
        let paths: Vec<_> = table.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["ops/deploy.md", "style.md", "onboarding.md"]);
    }

    #[test]
    fn test_parse_row_fields() {
        let table = IndexTable::parse(INDEX);
        let first = &table.entries()[0];
        assert_eq!(first.topic, "Deploy runbook");
        assert_eq!(first.tags, vec!["deploy", "ops"]);
        assert_eq!(first.updated_at, NaiveDate::from_ymd_opt(2026, 1, 12));
        assert_eq!(first.line, 7);

        assert_eq!(table.entries()[2].updated_at, None);
    }

    #[test]
    fn test_parse_short_rows_skipped() {
        let table = IndexTable::parse("| Topic | File | Tags | Updated |\n| only topic |\n");
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_without_header_uses_default_columns() {
        let table = IndexTable::parse("| API | api.md | api | 2026-03-03 |");
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].path, "api.md");
    }

    #[test]
    fn test_parse_reordered_header() {
        let table =
            IndexTable::parse("| File | Tags | Topic |\n|---|---|---|\n| a.md | db | Schema |\n");
        let entry = &table.entries()[0];
        assert_eq!(entry.path, "a.md");
        assert_eq!(entry.topic, "Schema");
        assert_eq!(entry.tags, vec!["db"]);
        assert_eq!(entry.updated_at, None);
    }

    #[test]
    fn test_parse_pipe_separated_tags() {
        let table = IndexTable::parse(
            "| Topic | File | Tags | Updated |\n|---|---|---|---|\n| Ops | ops.md | deploy | ops | 2026-01-02 |\n",
        );
        let entry = &table.entries()[0];
        assert_eq!(entry.tags, vec!["deploy", "ops"]);
        assert_eq!(entry.updated_at, NaiveDate::from_ymd_opt(2026, 1, 2));
    }

    #[test]
    fn test_parse_data_row_with_file_tag_is_not_a_header() {
        let table = IndexTable::parse(
            "| Topic | File | Tags | Updated |
|---|---|---|---|
| File handling | io.md | file | 2026-01-01 |
| Path rules | paths.md | Path | 2026-01-01 |
| Code style | style.md | code | 2026-01-02 |
",
        );
        let paths: Vec<_> = table.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["io.md", "paths.md", "style.md"]);
        assert_eq!(table.entries()[0].tags, vec!["file"]);
        assert_eq!(table.entries()[2].tags, vec!["code"]);
    }

    #[test]
    fn test_parse_second_table_gets_its_own_header() {
        let table = IndexTable::parse(
            "| Topic | File | Tags |
|---|---|---|
| A | a.md | code |

| Tags | File |
|---|---|
| db | b.md |
",
        );
        let paths: Vec<_> = table.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.md"]);
        assert_eq!(table.entries()[1].tags, vec!["db"]);
    }

    #[test]
    fn test_parse_tags_tokenizer() {
        assert_eq!(
            parse_tags("`Deploy`, #ops /db;  [api] Code code"),
            vec!["deploy", "ops", "db", "api", "code"]
        );
        assert!(parse_tags("  ,, | ").is_empty());
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = IndexTable::load(Path::new("/nonexistent/INDEX.md")).unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[test]
    fn test_matching_tags() {
        let table = IndexTable::parse(INDEX);
        let wanted: crate::tags::TagSet = ["ops".to_string(), "code".to_string()].into();
        assert_eq!(table.entries()[0].matching_tags(&wanted), vec!["ops"]);
        assert!(table.entries()[2].matching_tags(&wanted).is_empty());
    }
}
