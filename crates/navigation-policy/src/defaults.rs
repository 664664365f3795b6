use std::collections::HashMap;

use crate::model::{BlocklistPolicy, ChangePasswordPolicy, NavigationPolicyConfig};

pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 10_000;

pub fn default_config() -> NavigationPolicyConfig {
    NavigationPolicyConfig {
        blocklist: BlocklistPolicy {
            hosts: Vec::new(),
            schemes: vec!["javascript".into()],
        },
        block_universal_links: false,
        response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        change_password: ChangePasswordPolicy { enabled: true },
        provenance: HashMap::new(),
    }
}

impl Default for NavigationPolicyConfig {
    fn default() -> Self {
        default_config()
    }
}
