use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration consumed by [`crate::WebStateSession`] and the built-in deciders.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigationPolicyConfig {
    pub blocklist: BlocklistPolicy,
    /// Allowed navigations are reported to the engine with universal links blocked.
    pub block_universal_links: bool,
    /// Upper bound on how long one decider may hold a response decision.
    /// Zero waits until the decider answers or the session is destroyed.
    pub response_timeout_ms: u64,
    pub change_password: ChangePasswordPolicy,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub provenance: HashMap<String, PolicyProvenance>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BlocklistPolicy {
    pub hosts: Vec<String>,
    pub schemes: Vec<String>,
}

impl BlocklistPolicy {
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.schemes.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChangePasswordPolicy {
    pub enabled: bool,
}

impl Default for ChangePasswordPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PolicyProvenance {
    pub path: String,
    pub source: PolicySource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicySource {
    Builtin,
    File,
    Env,
}

impl NavigationPolicyConfig {
    pub fn set_provenance(&mut self, path: &str, source: PolicySource) {
        self.provenance.insert(
            path.to_string(),
            PolicyProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    pub fn source_of(&self, path: &str) -> Option<PolicySource> {
        self.provenance.get(path).map(|entry| entry.source)
    }
}
