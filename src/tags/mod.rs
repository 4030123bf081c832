//! Tag resolution for task delegation.
//!
//! Maps a role and a free-text task description to the set of knowledge
//! tags worth searching for:
//! - role defaults (static table, overridable from config)
//! - keyword-triggered tags from the task text
//! - the always-present `onboarding` tag

mod resolver;
mod role;
mod rules;

pub use resolver::*;
pub use role::*;
pub use rules::*;
