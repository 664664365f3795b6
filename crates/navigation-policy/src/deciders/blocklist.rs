use url::Url;
use webstate_core_types::{RequestDescriptor, RequestInfo};

use crate::decider::NavigationPolicyDecider;
use crate::decision::PolicyDecision;
use crate::model::BlocklistPolicy;

/// Cancels requests whose scheme or host is listed. A listed host also
/// matches its subdomains.
#[derive(Debug, Clone, Default)]
pub struct UrlBlocklistDecider {
    hosts: Vec<String>,
    schemes: Vec<String>,
}

impl UrlBlocklistDecider {
    pub fn new(policy: &BlocklistPolicy) -> Self {
        Self {
            hosts: policy
                .hosts
                .iter()
                .map(|host| host.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
            schemes: policy
                .schemes
                .iter()
                .map(|scheme| scheme.trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_blocked(&self, url: &Url) -> bool {
        if self.schemes.iter().any(|scheme| scheme == url.scheme()) {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.hosts.iter().any(|blocked| {
            host == *blocked
                || host
                    .strip_suffix(blocked.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl NavigationPolicyDecider for UrlBlocklistDecider {
    fn name(&self) -> &str {
        "url_blocklist"
    }

    fn decide_request(&self, request: &RequestDescriptor, _info: &RequestInfo) -> PolicyDecision {
        if self.is_blocked(&request.url) {
            PolicyDecision::Cancel
        } else {
            PolicyDecision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decider() -> UrlBlocklistDecider {
        UrlBlocklistDecider::new(&BlocklistPolicy {
            hosts: vec!["Tracker.example".into()],
            schemes: vec!["javascript".into()],
        })
    }

    #[test]
    fn matches_host_and_subdomains() {
        let decider = decider();
        assert!(decider.is_blocked(&Url::parse("https://tracker.example/a").unwrap()));
        assert!(decider.is_blocked(&Url::parse("https://cdn.tracker.example/").unwrap()));
        assert!(!decider.is_blocked(&Url::parse("https://nottracker.example/").unwrap()));
        assert!(!decider.is_blocked(&Url::parse("https://example.com/").unwrap()));
    }

    #[test]
    fn matches_scheme() {
        let decider = decider();
        assert!(decider.is_blocked(&Url::parse("javascript:alert(1)").unwrap()));
        assert!(!decider.is_blocked(&Url::parse("about:blank").unwrap()));
    }
}
