//! Colored CLI display utilities.
//!
//! Everything the user sees before the runner takes over goes through here,
//! as tagged lines (`[CONTEXT]`, `[WARN]`, ...).

use std::io::{self, Write};
use std::path::Path;

use owo_colors::OwoColorize;

use crate::delegate::DelegationCommand;
use crate::knowledge::{
    FileSelector, Finding, IndexTable, Issue, SelectionResult, SkipReason,
};
use crate::tags::{TagResolver, TagSet};

/// Truncate a string to at most `max_len` characters, adding an ellipsis.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

fn join_tags<'a>(tags: impl IntoIterator<Item = &'a String>) -> String {
    tags.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Format a byte count compactly.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        #[allow(clippy::cast_precision_loss)]
        let kib = bytes as f64 / 1024.0;
        format!("{kib:.1} KiB")
    }
}

/// Print the resolved tag set.
pub fn print_tags(role: &str, tags: &TagSet) {
    println!(
        "{} {} -> {}",
        "[TAGS]".cyan().bold(),
        role.bold(),
        join_tags(tags)
    );
    let _ = io::stdout().flush();
}

/// Print the files chosen as context.
pub fn print_selection(result: &SelectionResult, index_path: &Path) {
    if !result.knowledge_base_found {
        print_warning(&format!(
            "No knowledge base at {}, delegating without context",
            index_path.display()
        ));
    }

    if result.is_empty() {
        println!("{} No context files", "[CONTEXT]".blue().bold());
    } else {
        println!(
            "{} {} file(s) selected",
            "[CONTEXT]".blue().bold(),
            result.len()
        );
        for file in &result.files {
            println!(
                "  - {} {} {}",
                file.relative.cyan(),
                truncate(&file.topic, 50).dimmed(),
                format!("[{}]", join_tags(&file.matched_tags)).dimmed()
            );
        }
    }
    let _ = io::stdout().flush();
}

/// Print why rows were left out of a selection.
pub fn print_skipped(result: &SelectionResult) {
    for skipped in &result.skipped {
        let reason = match skipped.reason {
            SkipReason::OutsideKnowledgeDir => "outside knowledge dir".to_string(),
            SkipReason::Missing => "missing".to_string(),
            SkipReason::NoTagMatch => "no matching tags".to_string(),
            SkipReason::Oversized { size } => format!("too large ({})", format_size(size)),
        };
        println!(
            "{} {} - {}",
            "[SKIP]".yellow().bold(),
            skipped.relative,
            reason.dimmed()
        );
    }
    let _ = io::stdout().flush();
}

/// Print the command a dry run would have executed.
pub fn print_dry_run(command: &DelegationCommand) {
    println!(
        "{} {}",
        "[DRY-RUN]".magenta().bold(),
        command.display_command()
    );
    let _ = io::stdout().flush();
}

/// Print every index row with its on-disk status.
pub fn print_index(table: &IndexTable, selector: &FileSelector) {
    if table.is_empty() {
        println!("{} Index has no rows", "[INDEX]".blue().bold());
        return;
    }

    let max_bytes = selector.limits().max_file_bytes;
    for entry in table {
        let size = selector
            .resolve(&entry.path)
            .and_then(|p| std::fs::metadata(p).ok())
            .filter(std::fs::Metadata::is_file)
            .map(|m| m.len());

        let status = match size {
            None => "missing".red().to_string(),
            Some(size) if size >= max_bytes => {
                format!("too large ({})", format_size(size)).yellow().to_string()
            }
            Some(size) => format_size(size).green().to_string(),
        };
        let updated = entry
            .updated_at
            .map_or_else(|| "-".to_string(), |d| d.to_string());

        println!(
            "{} {} {} [{}] {} {}",
            "[INDEX]".blue().bold(),
            entry.path.cyan(),
            truncate(&entry.topic, 40),
            join_tags(&entry.tags),
            updated.dimmed(),
            status
        );
    }
    let _ = io::stdout().flush();
}

/// Print knowledge base audit findings.
pub fn print_findings(findings: &[Finding]) {
    if findings.is_empty() {
        println!("{} Knowledge base looks healthy", "[CHECK]".green().bold());
        let _ = io::stdout().flush();
        return;
    }

    for finding in findings {
        let detail = match &finding.issue {
            Issue::DuplicatePath { first_line } => {
                format!("duplicate of line {first_line}")
            }
            Issue::OutsideKnowledgeDir => "path escapes the knowledge directory".to_string(),
            Issue::Missing => "file does not exist".to_string(),
            Issue::Oversized { size, limit } => format!(
                "{} exceeds the {} auto-include limit",
                format_size(*size),
                format_size(*limit)
            ),
            Issue::Untagged => "no tags".to_string(),
            Issue::Stale { updated, age_days } => {
                format!("last updated {updated} ({age_days} days ago)")
            }
            Issue::TagMismatch {
                index_only,
                header_only,
            } => format!(
                "tags differ (index only: [{}], header only: [{}])",
                join_tags(index_only),
                join_tags(header_only)
            ),
        };
        println!(
            "{} {}:{} {} - {}",
            "[CHECK]".yellow().bold(),
            "INDEX".dimmed(),
            finding.line,
            finding.path.cyan(),
            detail
        );
    }
    let _ = io::stdout().flush();
}

/// Print known roles with aliases and base tags.
pub fn print_roles(resolver: &TagResolver) {
    for (name, tags) in resolver.roles() {
        let aliases = resolver.aliases_of(name);
        let aliases = if aliases.is_empty() {
            String::new()
        } else {
            format!("({})", aliases.join(", "))
        };
        println!(
            "{} {} {} -> {}",
            "[ROLE]".cyan().bold(),
            name.bold(),
            aliases.dimmed(),
            join_tags(tags)
        );
    }
    let _ = io::stdout().flush();
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
