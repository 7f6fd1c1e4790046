use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Membership store for the allied-country predicate. Keyed by resolved
/// display name, exactly as the atlas and micro-state list report them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllianceRoster {
    members: HashSet<String>,
}

impl AllianceRoster {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allied(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
