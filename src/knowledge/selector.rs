//! Context file selection.
//!
//! Walks the index in manifest order and keeps rows that exist on disk,
//! share at least one tag with the query, and are under the size ceiling.
//! Scanning stops once the file limit is reached. The knowledge base is
//! never written to.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::config::{DelegateConfig, DEFAULT_INDEX_FILE, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES};
use crate::tags::TagSet;

use super::index::{IndexEntry, IndexError, IndexTable};

/// Count and size bounds for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLimits {
    /// Maximum number of files selected.
    pub max_files: usize,
    /// Files of this size or larger are skipped.
    pub max_file_bytes: u64,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// A knowledge file chosen as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    /// Path as written in the index.
    pub relative: String,
    /// Path on disk.
    pub path: PathBuf,
    /// Topic from the index.
    pub topic: String,
    /// Size in bytes at selection time.
    pub size: u64,
    /// Index tags that matched the query.
    pub matched_tags: Vec<String>,
}

/// Why an index row was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// Absolute path or one that climbs out of the knowledge directory.
    OutsideKnowledgeDir,
    /// No regular file at the path.
    Missing,
    /// No tag in common with the query.
    NoTagMatch,
    /// At or above the size ceiling.
    Oversized { size: u64 },
}

/// An index row left out of the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub relative: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of a selection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    /// Whether the index manifest could be read.
    pub knowledge_base_found: bool,
    /// Selected files, in index order.
    pub files: Vec<SelectedFile>,
    /// Rows evaluated and rejected, in index order.
    pub skipped: Vec<SkippedFile>,
}

impl SelectionResult {
    /// An empty result for a knowledge base without a readable manifest.
    #[must_use]
    pub fn no_knowledge_base() -> Self {
        Self {
            knowledge_base_found: false,
            files: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// On-disk paths of the selected files.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Number of selected files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Selects knowledge files for a resolved tag set.
#[derive(Debug, Clone)]
pub struct FileSelector {
    knowledge_dir: PathBuf,
    index_file: String,
    limits: SelectionLimits,
}

impl FileSelector {
    /// Create a selector from the delegation config.
    #[must_use]
    pub fn new(config: &DelegateConfig) -> Self {
        Self {
            knowledge_dir: config.knowledge_dir.clone(),
            index_file: config.index_file.clone(),
            limits: SelectionLimits {
                max_files: config.max_files,
                max_file_bytes: config.max_file_bytes,
            },
        }
    }

    /// Create a selector for a knowledge directory with explicit limits.
    #[must_use]
    pub fn with_limits(knowledge_dir: impl Into<PathBuf>, limits: SelectionLimits) -> Self {
        Self {
            knowledge_dir: knowledge_dir.into(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            limits,
        }
    }

    /// Root of the knowledge base.
    #[must_use]
    pub fn knowledge_dir(&self) -> &Path {
        &self.knowledge_dir
    }

    /// Full path of the index manifest.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.knowledge_dir.join(&self.index_file)
    }

    /// Active limits.
    #[must_use]
    pub fn limits(&self) -> SelectionLimits {
        self.limits
    }

    /// Load the index manifest, or `None` when unavailable.
    #[must_use]
    pub fn load_index(&self) -> Option<IndexTable> {
        match IndexTable::load(&self.index_path()) {
            Ok(table) => Some(table),
            Err(IndexError::NotFound(path)) => {
                tracing::info!(path = %path.display(), "No knowledge base found");
                None
            }
            Err(e) => {
                tracing::info!(error = %e, "Knowledge base unreadable, treating as missing");
                None
            }
        }
    }

    /// Load the manifest and select files for `tags`.
    ///
    /// Never fails: a missing manifest yields an empty result with
    /// `knowledge_base_found` unset.
    #[must_use]
    pub fn select(&self, tags: &TagSet) -> SelectionResult {
        match self.load_index() {
            Some(table) => self.select_from(&table, tags),
            None => SelectionResult::no_knowledge_base(),
        }
    }

    /// Select files for `tags` from an already parsed index.
    #[must_use]
    pub fn select_from(&self, table: &IndexTable, tags: &TagSet) -> SelectionResult {
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for entry in table {
            if files.len() >= self.limits.max_files {
                break;
            }
            match self.evaluate(entry, tags) {
                Ok(file) => {
                    tracing::debug!(path = %file.relative, matched = ?file.matched_tags, "Selected context file");
                    files.push(file);
                }
                Err(reason) => {
                    tracing::debug!(path = %entry.path, ?reason, "Skipped index row");
                    skipped.push(SkippedFile {
                        relative: entry.path.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            selected = files.len(),
            skipped = skipped.len(),
            max_files = self.limits.max_files,
            "Context selection complete"
        );

        SelectionResult {
            knowledge_base_found: true,
            files,
            skipped,
        }
    }

    fn evaluate(&self, entry: &IndexEntry, tags: &TagSet) -> Result<SelectedFile, SkipReason> {
        let path = self
            .resolve(&entry.path)
            .ok_or(SkipReason::OutsideKnowledgeDir)?;

        let metadata = std::fs::metadata(&path).map_err(|_| SkipReason::Missing)?;
        if !metadata.is_file() {
            return Err(SkipReason::Missing);
        }

        let matched_tags = entry.matching_tags(tags);
        if matched_tags.is_empty() {
            return Err(SkipReason::NoTagMatch);
        }

        let size = metadata.len();
        if size >= self.limits.max_file_bytes {
            return Err(SkipReason::Oversized { size });
        }

        Ok(SelectedFile {
            relative: entry.path.clone(),
            path,
            topic: entry.topic.clone(),
            size,
            matched_tags,
        })
    }

    /// Join a relative index path onto the knowledge directory, refusing
    /// absolute paths and `..` components.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let rel = Path::new(relative);
        let contained = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if contained && rel.components().next().is_some() {
            Some(self.knowledge_dir.join(rel))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn tags(list: &[&str]) -> TagSet {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn kb(index: &str, files: &[(&str, usize)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("INDEX.md"), index).unwrap();
        for (name, size) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, "x".repeat(*size)).unwrap();
        }
        dir
    }

    fn selector(dir: &TempDir, max_files: usize, max_file_bytes: u64) -> FileSelector {
        FileSelector::with_limits(
            dir.path(),
            SelectionLimits {
                max_files,
                max_file_bytes,
            },
        )
    }

    const INDEX: &str = "| Topic | File | Tags | Updated |
|---|---|---|---|
| One | one.md | code | 2026-01-01 |
| Two | two.md | code, api | 2026-01-01 |
| Three | three.md | docs | 2026-01-01 |
| Four | sub/four.md | api | 2026-01-01 |
";

    #[test]
    fn test_select_respects_tag_intersection() {
        let dir = kb(INDEX, &[("one.md", 10), ("two.md", 10), ("three.md", 10), ("sub/four.md", 10)]);
        let result = selector(&dir, 5, 15_000).select(&tags(&["api"]));

        let selected: Vec<_> = result.files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(selected, vec!["two.md", "sub/four.md"]);
        assert_eq!(result.files[0].matched_tags, vec!["api"]);
        assert!(result.knowledge_base_found);
    }

    #[test]
    fn test_select_caps_at_max_files() {
        let dir = kb(INDEX, &[("one.md", 10), ("two.md", 10), ("three.md", 10), ("sub/four.md", 10)]);
        for max in 0..4 {
            let result = selector(&dir, max, 15_000).select(&tags(&["code", "api", "docs"]));
            assert_eq!(result.len(), max);
        }
    }

    #[test]
    fn test_select_skips_oversized_boundary() {
        let dir = kb(INDEX, &[("one.md", 100), ("two.md", 99)]);
        let result = selector(&dir, 5, 100).select(&tags(&["code"]));

        assert_eq!(result.len(), 1);
        assert_eq!(result.files[0].relative, "two.md");
        assert!(result.skipped.contains(&SkippedFile {
            relative: "one.md".to_string(),
            reason: SkipReason::Oversized { size: 100 },
        }));
    }

    #[test]
    fn test_select_skips_missing_files() {
        let dir = kb(INDEX, &[("one.md", 10), ("two.md", 10)]);
        fs::remove_file(dir.path().join("one.md")).unwrap();

        let result = selector(&dir, 5, 15_000).select(&tags(&["code", "api"]));
        assert_eq!(result.paths(), vec![dir.path().join("two.md")]);
        assert_eq!(result.skipped[0].reason, SkipReason::Missing);
    }

    #[test]
    fn test_select_skips_directories() {
        let dir = kb(INDEX, &[("two.md", 10)]);
        fs::create_dir(dir.path().join("one.md")).unwrap();

        let result = selector(&dir, 5, 15_000).select(&tags(&["code"]));
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].relative, "two.md");
    }

    #[test]
    fn test_select_missing_index() {
        let dir = TempDir::new().unwrap();
        let result = selector(&dir, 5, 15_000).select(&tags(&["code"]));
        assert_eq!(result, SelectionResult::no_knowledge_base());
    }

    #[test]
    fn test_select_refuses_escaping_paths() {
        let index = "| Topic | File | Tags | Updated |\n|---|---|---|---|\n\
            | Up | ../secret.md | code | |\n| Abs | /etc/hosts | code | |\n";
        let dir = kb(index, &[]);
        let result = selector(&dir, 5, 15_000).select(&tags(&["code"]));

        assert!(result.is_empty());
        assert!(result
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::OutsideKnowledgeDir));
    }

    #[test]
    fn test_select_is_idempotent() {
        let dir = kb(INDEX, &[("one.md", 10), ("two.md", 10), ("sub/four.md", 10)]);
        let sel = selector(&dir, 5, 15_000);
        let wanted = tags(&["code", "api"]);
        assert_eq!(sel.select(&wanted), sel.select(&wanted));
    }

    #[test]
    fn test_resolve_paths() {
        let sel = FileSelector::with_limits("/kb", SelectionLimits::default());
        assert_eq!(sel.resolve("./a/b.md"), Some(PathBuf::from("/kb/./a/b.md")));
        assert_eq!(sel.resolve("a/../../b.md"), None);
        assert_eq!(sel.resolve(""), None);
    }
}
