//! Runner command construction.
//!
//! The runner receives, in order: its configured leading arguments, one
//! context flag per selected file, the agent name, and the task text.

use std::borrow::Cow;
use std::path::PathBuf;

use chrono::Local;
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::tags::Role;

/// Generate a task id of the form `YYYYmmdd-HHMMSS-xxxxxxxx`.
#[must_use]
pub fn generate_task_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Local::now().format("%Y%m%d-%H%M%S"), &suffix[..8])
}

/// Builder for the runner invocation.
#[derive(Debug, Clone)]
pub struct DelegationCommand {
    runner: RunnerConfig,
    role: String,
    task: String,
    context_files: Vec<PathBuf>,
    task_id: Option<String>,
}

impl DelegationCommand {
    /// Create a command delegating `task` to `role`.
    #[must_use]
    pub fn new(runner: &RunnerConfig, role: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            runner: runner.clone(),
            role: role.into(),
            task: task.into(),
            context_files: Vec::new(),
            task_id: None,
        }
    }

    /// Add context files, passed in the given order.
    #[must_use]
    pub fn context_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.context_files.extend(files);
        self
    }

    /// Attach a task id. Only passed when the runner has a task id flag.
    #[must_use]
    pub fn task_id(mut self, id: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    /// Runner executable.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.runner.program
    }

    /// Role the task is delegated to, as given.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Agent name handed to the runner.
    ///
    /// Aliases and case variants are folded onto the canonical role before
    /// consulting `runner.agents`. Names the table does not know pass
    /// through unchanged.
    #[must_use]
    pub fn agent(&self) -> &str {
        let key = self.role.trim().to_lowercase();
        let canonical = Role::lookup(&key).map_or(key.as_str(), |r| r.name());
        self.runner
            .agents
            .get(canonical)
            .or_else(|| self.runner.agents.get(&key))
            .map_or(self.role.as_str(), String::as_str)
    }

    /// The task text.
    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    /// The attached task id, if any.
    #[must_use]
    pub fn get_task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Build the command-line arguments.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.runner.args.clone();

        for file in &self.context_files {
            args.push(self.runner.context_flag.clone());
            args.push(file.to_string_lossy().into_owned());
        }

        args.push(self.agent().to_string());

        if !self.runner.task_flag.is_empty() {
            args.push(self.runner.task_flag.clone());
        }
        args.push(self.task.clone());

        if let (Some(flag), Some(id)) = (&self.runner.task_id_flag, &self.task_id) {
            args.push(flag.clone());
            args.push(id.clone());
        }

        args
    }

    /// Render the full command line, shell-quoted.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.runner.program.clone())
            .chain(self.build_args())
            .map(|arg| shell_escape::escape(Cow::Owned(arg)).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
