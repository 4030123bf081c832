//! Keyword rules that add tags based on the task text.

use serde::{Deserialize, Serialize};

/// A substring rule: if any trigger appears in the task, all tags apply.
///
/// Matching is plain case-insensitive containment, so `db` also fires on
/// words like "feedback". Rules are independent and cumulative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Substrings searched for in the task text.
    pub triggers: Vec<String>,
    /// Tags contributed when any trigger matches.
    pub tags: Vec<String>,
}

impl KeywordRule {
    /// Create a rule from string slices.
    #[must_use]
    pub fn new(triggers: &[&str], tags: &[&str]) -> Self {
        Self {
            triggers: triggers.iter().map(|s| (*s).to_string()).collect(),
            tags: tags.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Check the rule against task text that is already lowercased.
    #[must_use]
    pub fn matches(&self, task_lower: &str) -> bool {
        self.triggers.iter().any(|trigger| {
            let trigger = trigger.trim().to_lowercase();
            !trigger.is_empty() && task_lower.contains(&trigger)
        })
    }
}

/// The built-in keyword rule list.
#[must_use]
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(&["deploy"], &["deploy", "ops"]),
        KeywordRule::new(&["test"], &["test"]),
        KeywordRule::new(&["api"], &["api"]),
        KeywordRule::new(&["database", "db", "migration"], &["db", "migration"]),
        KeywordRule::new(&["auth", "login"], &["auth", "security"]),
        KeywordRule::new(&["docker", "kubernetes", "k8s"], &["ops", "deploy"]),
        KeywordRule::new(&["refactor", "architecture"], &["arch"]),
    ]
}
