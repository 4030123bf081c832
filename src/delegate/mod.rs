//! Task delegation to the external agent runner.
//!
//! A delegation runs strictly in sequence: resolve tags, select context
//! files, build the runner command, then hand off and wait.

mod command;
mod error;
mod runner;

pub use command::*;
pub use error::*;
pub use runner::*;

use crate::config::DelegateConfig;
use crate::knowledge::{FileSelector, SelectionResult};
use crate::tags::{TagResolver, TagSet};

/// Everything decided before the runner is started.
#[derive(Debug, Clone)]
pub struct DelegationPlan {
    /// Tags searched for.
    pub tags: TagSet,
    /// Selected context files.
    pub selection: SelectionResult,
    /// The runner invocation.
    pub command: DelegationCommand,
}

impl DelegationPlan {
    /// Resolve tags, select context and build the runner command.
    ///
    /// Never fails: a missing knowledge base produces a plan with no
    /// context files.
    #[must_use]
    pub fn build(config: &DelegateConfig, role: &str, task: &str) -> Self {
        let resolver = TagResolver::from_config(&config.tags);
        let selector = FileSelector::new(config);
        Self::build_with(&resolver, &selector, config, role, task)
    }

    /// Like [`DelegationPlan::build`] with an existing resolver and selector.
    #[must_use]
    pub fn build_with(
        resolver: &TagResolver,
        selector: &FileSelector,
        config: &DelegateConfig,
        role: &str,
        task: &str,
    ) -> Self {
        let tags = resolver.resolve(role, task);
        let selection = selector.select(&tags);
        let command = DelegationCommand::new(&config.runner, role, task)
            .context_files(selection.paths())
            .task_id(generate_task_id());

        tracing::info!(
            role = %role,
            agent = %command.agent(),
            task_id = ?command.get_task_id(),
            context_files = selection.len(),
            "Planned delegation"
        );

        Self {
            tags,
            selection,
            command,
        }
    }
}
