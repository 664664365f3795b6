use webstate_core_types::{RequestDescriptor, RequestInfo, ResponseDescriptor};

use crate::decision::{PolicyDecision, ResponseReply};

/// Pluggable veto point consulted by a [`crate::WebStateSession`] before a
/// navigation starts and before it commits.
///
/// A decider is attached to one session for its whole life. Implementations
/// must not panic; the session treats a panic as [`PolicyDecision::Allow`].
pub trait NavigationPolicyDecider: Send + Sync {
    /// Short label used in logs and cancellation events.
    fn name(&self) -> &str;

    /// Called once per navigation before observers learn that it started.
    /// Never called for same-document back/forward or state-change navigations.
    fn decide_request(&self, _request: &RequestDescriptor, _info: &RequestInfo) -> PolicyDecision {
        PolicyDecision::Allow
    }

    /// Called once per navigation before it commits. The answer may be sent
    /// through `reply` synchronously or from a spawned task.
    fn decide_response(
        &self,
        _response: &ResponseDescriptor,
        _for_main_frame: bool,
        reply: ResponseReply,
    ) {
        reply.allow();
    }

    /// The owning session is going away. Fired exactly once; the decider must
    /// not call back into the session from here.
    fn session_destroyed(&self) {}
}
