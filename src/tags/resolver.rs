//! Role + task text to tag set.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::TagConfig;

use super::role::Role;
use super::rules::{default_rules, KeywordRule};

/// Tag included in every resolution.
pub const ALWAYS_TAG: &str = "onboarding";

/// An ordered set of normalized tags.
pub type TagSet = BTreeSet<String>;

/// Normalize a tag: trimmed and lowercase. Returns `None` for blanks.
#[must_use]
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

fn tag_set<'a>(tags: impl IntoIterator<Item = &'a str>) -> TagSet {
    tags.into_iter().filter_map(normalize_tag).collect()
}

/// Resolves the tags to search for when delegating a task.
#[derive(Debug, Clone)]
pub struct TagResolver {
    /// Canonical role name -> base tags.
    roles: BTreeMap<String, TagSet>,
    /// Alias -> canonical role name.
    aliases: BTreeMap<String, String>,
    rules: Vec<KeywordRule>,
}

impl TagResolver {
    /// Create a resolver with the built-in role table and keyword rules.
    #[must_use]
    pub fn new() -> Self {
        let mut roles = BTreeMap::new();
        let mut aliases = BTreeMap::new();

        for role in Role::ALL {
            roles.insert(role.name().to_string(), tag_set(role.base_tags().iter().copied()));
            for alias in role.aliases() {
                aliases.insert((*alias).to_string(), role.name().to_string());
            }
        }

        Self {
            roles,
            aliases,
            rules: default_rules(),
        }
    }

    /// Create a resolver with config overrides applied on top of the built-ins.
    ///
    /// Configured roles replace the built-in tag list for that role (or its
    /// alias target) and new names become additional roles. Configured rules
    /// are appended to the built-in rules.
    #[must_use]
    pub fn from_config(config: &TagConfig) -> Self {
        let mut resolver = Self::new();

        for (name, tags) in &config.roles {
            let Some(name) = normalize_tag(name) else {
                continue;
            };
            let canonical = resolver.aliases.get(&name).cloned().unwrap_or(name);
            let tags = tag_set(tags.iter().map(String::as_str));
            tracing::debug!(role = %canonical, ?tags, "Overriding role tags from config");
            resolver.roles.insert(canonical, tags);
        }

        resolver.rules.extend(config.rules.iter().cloned());
        resolver
    }

    /// Base tags for a role; unknown roles get the `default` role's tags.
    #[must_use]
    pub fn base_tags(&self, role: &str) -> TagSet {
        let name = role.trim().to_lowercase();
        let canonical = self.aliases.get(&name).unwrap_or(&name);

        match self.roles.get(canonical) {
            Some(tags) => tags.clone(),
            None => {
                tracing::debug!(role = %role, "Unknown role, using default tags");
                self.roles
                    .get(Role::Default.name())
                    .cloned()
                    .unwrap_or_default()
            }
        }
    }

    /// Resolve the full tag set for a role and task.
    ///
    /// Never empty: [`ALWAYS_TAG`] is always included.
    #[must_use]
    pub fn resolve(&self, role: &str, task: &str) -> TagSet {
        let mut tags = self.base_tags(role);
        let task_lower = task.to_lowercase();

        for rule in self.rules.iter().filter(|r| r.matches(&task_lower)) {
            tags.extend(rule.tags.iter().filter_map(|t| normalize_tag(t)));
        }

        tags.insert(ALWAYS_TAG.to_string());
        tracing::debug!(role = %role, ?tags, "Resolved tags");
        tags
    }

    /// Known roles with their base tags, by canonical name.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &TagSet)> {
        self.roles.iter().map(|(name, tags)| (name.as_str(), tags))
    }

    /// Aliases that resolve to the given canonical role.
    #[must_use]
    pub fn aliases_of(&self, role: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, canonical)| canonical.as_str() == role)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    /// The active keyword rules, built-in first.
    #[must_use]
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}

impl Default for TagResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_unknown_role_still_gets_onboarding() {
        let resolver = TagResolver::new();
        for role in ["janitor", "", "  ", "IMPLEMENTERS"] {
            let tags = resolver.resolve(role, "do something");
            assert!(!tags.is_empty());
            assert!(tags.contains(ALWAYS_TAG));
            assert!(tags.contains("general"), "role {role:?} -> {tags:?}");
        }
    }

    #[test]
    fn test_deploy_adds_deploy_and_ops() {
        let resolver = TagResolver::new();
        for task in ["deploy it", "Please DEPLOY the service", "redeployment plan"] {
            let tags = resolver.resolve("tester", task);
            assert!(tags.contains("deploy"), "{task}");
            assert!(tags.contains("ops"), "{task}");
        }
    }

    #[test]
    fn test_implementer_deploy_task() {
        let resolver = TagResolver::new();
        let tags = resolver.resolve("implementer", "deploy the service");
        assert_eq!(
            tags,
            set(&["code", "arch", "api", "deploy", "ops", "onboarding"])
        );
    }

    #[test]
    fn test_rules_are_cumulative() {
        let resolver = TagResolver::new();
        let tags = resolver.resolve("default", "test the api migration before deploy");
        for tag in ["test", "api", "db", "migration", "deploy", "ops", "onboarding"] {
            assert!(tags.contains(tag), "missing {tag}: {tags:?}");
        }
    }

    #[test]
    fn test_alias_resolves_to_role_tags() {
        let resolver = TagResolver::new();
        assert_eq!(resolver.base_tags("code"), resolver.base_tags("implementer"));
        assert_eq!(resolver.base_tags("Design"), set(&["arch", "api", "design"]));
    }

    #[test]
    fn test_config_overrides_role_and_appends_rules() {
        let mut config = TagConfig::default();
        config
            .roles
            .insert("code".to_string(), vec!["Rust".to_string(), " ".to_string()]);
        config
            .roles
            .insert("writer".to_string(), vec!["docs".to_string()]);
        config.rules.push(KeywordRule::new(&["grpc"], &["rpc"]));

        let resolver = TagResolver::from_config(&config);

        assert_eq!(resolver.base_tags("implementer"), set(&["rust"]));
        assert_eq!(resolver.base_tags("writer"), set(&["docs"]));
        assert!(resolver.resolve("writer", "add a gRPC endpoint").contains("rpc"));
        assert_eq!(resolver.rules().len(), default_rules().len() + 1);
    }

    #[test]
    fn test_roles_listing_includes_aliases() {
        let resolver = TagResolver::new();
        let names: Vec<_> = resolver.roles().map(|(name, _)| name).collect();
        assert!(names.contains(&"implementer"));
        assert!(names.contains(&"default"));
        assert_eq!(resolver.aliases_of("implementer"), vec!["code"]);
    }
}
