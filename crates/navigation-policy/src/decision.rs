use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Outcome of a single decider consultation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    #[default]
    Allow,
    Cancel,
}

impl PolicyDecision {
    pub fn should_allow_navigation(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    pub fn should_cancel_navigation(&self) -> bool {
        matches!(self, PolicyDecision::Cancel)
    }
}

/// What the engine is told to do with a navigation action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationActionPolicy {
    Allow,
    /// Load in the web view, never hand the URL to a native application.
    AllowAndBlockUniversalLinks,
    Cancel,
}

pub fn allow_navigation_action_policy(block_universal_links: bool) -> NavigationActionPolicy {
    if block_universal_links {
        NavigationActionPolicy::AllowAndBlockUniversalLinks
    } else {
        NavigationActionPolicy::Allow
    }
}

/// Single-use handle through which a decider answers a response decision,
/// either before `decide_response` returns or later from another task.
///
/// Dropping the handle without answering counts as [`PolicyDecision::Allow`].
/// Once the session stops waiting (destroyed, timed out) the handle is closed
/// and answering is a no-op.
#[derive(Debug)]
pub struct ResponseReply {
    tx: oneshot::Sender<PolicyDecision>,
}

impl ResponseReply {
    pub fn channel() -> (Self, oneshot::Receiver<PolicyDecision>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Returns whether the session received the decision.
    pub fn send(self, decision: PolicyDecision) -> bool {
        self.tx.send(decision).is_ok()
    }

    pub fn allow(self) -> bool {
        self.send(PolicyDecision::Allow)
    }

    pub fn cancel(self) -> bool {
        self.send(PolicyDecision::Cancel)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
