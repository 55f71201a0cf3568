use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The acting caller of a request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub roles: BTreeSet<String>,
}

pub const ANONYMOUS: &str = "anonymous";

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Principal {
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Principal::new(ANONYMOUS)
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS && self.roles.is_empty()
    }
}
