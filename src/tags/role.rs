//! Built-in delegation roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A specialist a task can be delegated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Architect,
    Implementer,
    Tester,
    Orchestrator,
    Github,
    /// Fallback for anything not recognized.
    Default,
}

impl Role {
    /// Every built-in role, in display order.
    pub const ALL: [Role; 6] = [
        Role::Architect,
        Role::Implementer,
        Role::Tester,
        Role::Orchestrator,
        Role::Github,
        Role::Default,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Role::Architect => "architect",
            Role::Implementer => "implementer",
            Role::Tester => "tester",
            Role::Orchestrator => "orchestrator",
            Role::Github => "github",
            Role::Default => "default",
        }
    }

    /// Agent names from the crew workspaces that resolve to this role.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Role::Architect => &["design"],
            Role::Implementer => &["code"],
            Role::Tester => &["test"],
            Role::Orchestrator => &["orca"],
            Role::Github | Role::Default => &[],
        }
    }

    /// Tags always searched for when delegating to this role.
    #[must_use]
    pub fn base_tags(self) -> &'static [&'static str] {
        match self {
            Role::Architect => &["arch", "api", "design"],
            Role::Implementer => &["code", "arch", "api"],
            Role::Tester => &["test", "code"],
            Role::Orchestrator => &["arch", "workflow"],
            Role::Github => &["git", "workflow"],
            Role::Default => &["general"],
        }
    }

    /// Agent the ClawCrew runner knows this role as. `Default` has none.
    #[must_use]
    pub fn agent_name(self) -> Option<&'static str> {
        match self {
            Role::Architect => Some("design"),
            Role::Implementer => Some("code"),
            Role::Tester => Some("test"),
            Role::Orchestrator => Some("orca"),
            Role::Github => Some("github"),
            Role::Default => None,
        }
    }

    /// Look up a role by name or alias, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Role> {
        let name = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.name() == name || role.aliases().contains(&name.as_str()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
