//! Configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tags::{KeywordRule, Role};

/// Default cap on the number of context files passed to the runner.
pub const DEFAULT_MAX_FILES: usize = 5;

/// Files at or above this size are never auto-included.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 15_000;

/// Name of the index manifest inside the knowledge directory.
pub const DEFAULT_INDEX_FILE: &str = "INDEX.md";

fn default_knowledge_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openclaw")
        .join("workspace-orca")
        .join("knowledge")
}

/// Configuration for knowledge selection and delegation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateConfig {
    /// Root of the knowledge base.
    pub knowledge_dir: PathBuf,
    /// Index manifest file name, relative to `knowledge_dir`.
    pub index_file: String,
    /// Maximum number of context files per delegation.
    pub max_files: usize,
    /// Files of this size or larger are skipped.
    pub max_file_bytes: u64,
    /// External agent runner invocation.
    pub runner: RunnerConfig,
    /// Tag resolution overrides.
    pub tags: TagConfig,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            knowledge_dir: default_knowledge_dir(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            runner: RunnerConfig::default(),
            tags: TagConfig::default(),
        }
    }
}

impl DelegateConfig {
    /// Full path of the index manifest.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.knowledge_dir.join(&self.index_file)
    }
}

/// How the external agent runner is invoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Runner executable.
    pub program: String,
    /// Arguments placed before everything else.
    pub args: Vec<String>,
    /// Flag preceding each context file.
    pub context_flag: String,
    /// Flag preceding the task text. Empty passes the task positionally.
    pub task_flag: String,
    /// Flag used to pass a generated task id, if any.
    pub task_id_flag: Option<String>,
    /// Role name -> agent name passed to the runner. Roles not listed are
    /// passed as given.
    pub agents: BTreeMap<String, String>,
}

fn default_agents() -> BTreeMap<String, String> {
    Role::ALL
        .into_iter()
        .filter_map(|role| {
            role.agent_name()
                .map(|agent| (role.name().to_string(), agent.to_string()))
        })
        .collect()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "clawcrew".to_string(),
            args: vec!["run".to_string()],
            context_flag: "--context".to_string(),
            task_flag: "--task".to_string(),
            task_id_flag: None,
            agents: default_agents(),
        }
    }
}

/// Tag resolution overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TagConfig {
    /// Role name -> base tags. Replaces the built-in list for that role.
    pub roles: BTreeMap<String, Vec<String>>,
    /// Extra keyword rules, applied after the built-in ones.
    pub rules: Vec<KeywordRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegate_config_defaults() {
        let config = DelegateConfig::default();
        assert_eq!(config.max_files, 5);
        assert_eq!(config.max_file_bytes, 15_000);
        assert_eq!(config.index_file, "INDEX.md");
        assert!(config.knowledge_dir.ends_with("workspace-orca/knowledge"));
        assert!(config.index_path().ends_with("knowledge/INDEX.md"));
    }

    #[test]
    fn test_runner_config_defaults() {
        let runner = RunnerConfig::default();
        assert_eq!(runner.program, "clawcrew");
        assert_eq!(runner.args, vec!["run"]);
        assert_eq!(runner.context_flag, "--context");
        assert_eq!(runner.task_flag, "--task");
        assert!(runner.task_id_flag.is_none());
        assert_eq!(runner.agents["implementer"], "code");
        assert_eq!(runner.agents["architect"], "design");
        assert!(!runner.agents.contains_key("default"));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_str = r#"
            knowledge_dir = "/srv/kb"
            max_files = 2

            [runner]
            program = "openclaw"
            args = ["agent", "--local"]
            task_id_flag = "--task-id"

            [tags.roles]
            tester = ["qa"]

            [[tags.rules]]
            triggers = ["cache"]
            tags = ["perf"]
        "#;

        let config: DelegateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.knowledge_dir, PathBuf::from("/srv/kb"));
        assert_eq!(config.max_files, 2);
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.runner.program, "openclaw");
        assert_eq!(config.runner.context_flag, "--context");
        assert_eq!(config.runner.task_id_flag.as_deref(), Some("--task-id"));
        assert_eq!(config.tags.roles["tester"], vec!["qa"]);
        assert_eq!(config.tags.rules.len(), 1);
        assert_eq!(config.runner.agents["tester"], "test");
    }

    #[test]
    fn test_deserialize_agent_table_replaces_defaults() {
        let toml_str = r#"
            [runner.agents]
            implementer = "builder"
        "#;

        let config: DelegateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.agents.len(), 1);
        assert_eq!(config.runner.agents["implementer"], "builder");
    }
}
